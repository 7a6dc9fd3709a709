/// Task endpoints
///
/// All paths are relative to `/api/v1/orgs/:org_id`.
///
/// - `GET    /tasks` - Paginated, filtered listing (newest first)
/// - `POST   /tasks` - Create a task
/// - `GET    /tasks/:id` - Fetch one task
/// - `PUT    /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Delete (admin)
/// - `GET    /tasks/:id/activity` - Timeline rebuilt from audit entries and comments
/// - `GET    /tasks/:id/comments` - Comments, oldest first
/// - `POST   /tasks/:id/comments` - Add a comment

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, AppQuery, ClientIp},
    response::{created, ok, paged, Envelope},
    routes::{double_option, Message, OrgItemPath, OrgPath},
};
use axum::{extract::State, http::StatusCode, Extension};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskhub_shared::{
    activity::{self, ActivityItem},
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::AuthContext,
    },
    models::{
        comment::TaskComment,
        task::{Recurrence, Task, TaskFilter, TaskPriority, TaskStatus},
        Pagination,
    },
    services::{
        tasks::{CreateTaskInput, UpdateTaskInput},
        Caller,
    },
    tenancy::TenantScope,
};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_recurring: bool,

    pub recurrence: Option<Recurrence>,
}

impl From<CreateTaskRequest> for CreateTaskInput {
    fn from(req: CreateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            tags: req.tags,
            due_date: req.due_date,
            is_recurring: req.is_recurring,
            recurrence: req.recurrence,
        }
    }
}

/// Partial update; omitted fields are left alone, `null` clears nullable ones
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    pub tags: Option<Vec<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub is_recurring: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    pub recurrence: Option<Option<Recurrence>>,
}

impl From<UpdateTaskRequest> for UpdateTaskInput {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            tags: req.tags,
            due_date: req.due_date,
            is_recurring: req.is_recurring,
            recurrence: req.recurrence,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "Comment body is required"))]
    pub body: String,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
    AppQuery(query): AppQuery<TaskListQuery>,
) -> ApiResult<Envelope<Vec<Task>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Tasks)?;

    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        assignee_id: query.assignee_id,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let pagination = Pagination::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let page = state.store.list_tasks(&scope, &filter, pagination).await?;
    Ok(paged(page, pagination))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgPath>,
    AppJson(req): AppJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Envelope<Task>)> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Create, Resource::Tasks)?;
    req.validate()?;

    let task = state
        .tasks
        .create(&scope, &Caller::new(&auth, ip), req.into())
        .await?;

    Ok(created(task))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgItemPath>,
) -> ApiResult<Envelope<Task>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Tasks)?;

    Ok(ok(state.tasks.get(&scope, path.id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgItemPath>,
    AppJson(req): AppJson<UpdateTaskRequest>,
) -> ApiResult<Envelope<Task>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Update, Resource::Tasks)?;
    req.validate()?;

    let task = state
        .tasks
        .update(&scope, &Caller::new(&auth, ip), path.id, req.into())
        .await?;

    Ok(ok(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgItemPath>,
) -> ApiResult<Envelope<Message>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Delete, Resource::Tasks)?;

    state
        .tasks
        .delete(&scope, &Caller::new(&auth, ip), path.id)
        .await?;

    Ok(ok(Message {
        message: "Task deleted",
    }))
}

pub async fn task_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgItemPath>,
) -> ApiResult<Envelope<Vec<ActivityItem>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Tasks)?;

    let items = activity::task_activity(state.store.as_ref(), &scope, path.id).await?;
    Ok(ok(items))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgItemPath>,
) -> ApiResult<Envelope<Vec<TaskComment>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Tasks)?;

    Ok(ok(state.tasks.comments(&scope, path.id).await?))
}

/// Commenting only needs read access to the task
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgItemPath>,
    AppJson(req): AppJson<CommentRequest>,
) -> ApiResult<(StatusCode, Envelope<TaskComment>)> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Tasks)?;
    req.validate()?;

    let comment = state
        .tasks
        .add_comment(&scope, &Caller::new(&auth, ip), path.id, &req.body)
        .await?;

    Ok(created(comment))
}
