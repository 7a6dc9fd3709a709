/// Task template endpoints
///
/// Relative to `/api/v1/orgs/:org_id`:
///
/// - `GET    /task-templates`
/// - `POST   /task-templates` - 409 on a duplicate name
/// - `GET    /task-templates/:id`
/// - `PUT    /task-templates/:id`
/// - `DELETE /task-templates/:id`
/// - `POST   /task-templates/:id/create-task` - Stamp an open task from the template

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, ClientIp},
    response::{created, ok, Envelope},
    routes::{double_option, Message, OrgItemPath, OrgPath},
};
use axum::{extract::State, http::StatusCode, Extension};
use serde::Deserialize;
use taskhub_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::AuthContext,
    },
    models::{
        task::{Task, TaskPriority},
        template::TaskTemplate,
    },
    services::{
        templates::{TemplateInput, TemplateUpdate},
        Caller,
    },
    tenancy::TenantScope,
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

pub async fn list_templates(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<Vec<TaskTemplate>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::TaskTemplate)?;

    Ok(ok(state.templates.list(&scope).await?))
}

pub async fn create_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgPath>,
    AppJson(req): AppJson<CreateTemplateRequest>,
) -> ApiResult<(StatusCode, Envelope<TaskTemplate>)> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Create, Resource::TaskTemplate)?;
    req.validate()?;

    let input = TemplateInput {
        name: req.name,
        title: req.title,
        description: req.description,
        priority: req.priority,
        assignee_id: req.assignee_id,
    };
    let template = state
        .templates
        .create(&scope, &Caller::new(&auth, ip), input)
        .await?;

    Ok(created(template))
}

pub async fn get_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgItemPath>,
) -> ApiResult<Envelope<TaskTemplate>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::TaskTemplate)?;

    Ok(ok(state.templates.get(&scope, path.id).await?))
}

pub async fn update_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgItemPath>,
    AppJson(req): AppJson<UpdateTemplateRequest>,
) -> ApiResult<Envelope<TaskTemplate>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Update, Resource::TaskTemplate)?;
    req.validate()?;

    let update = TemplateUpdate {
        name: req.name,
        title: req.title,
        description: req.description,
        priority: req.priority,
        assignee_id: req.assignee_id,
    };
    let template = state
        .templates
        .update(&scope, &Caller::new(&auth, ip), path.id, update)
        .await?;

    Ok(ok(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgItemPath>,
) -> ApiResult<Envelope<Message>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Delete, Resource::TaskTemplate)?;

    state
        .templates
        .delete(&scope, &Caller::new(&auth, ip), path.id)
        .await?;

    Ok(ok(Message {
        message: "Template deleted successfully",
    }))
}

/// Creating from a template is a task creation, so it needs `create tasks`
pub async fn create_task_from_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgItemPath>,
) -> ApiResult<(StatusCode, Envelope<Task>)> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Create, Resource::Tasks)?;

    let task = state
        .templates
        .instantiate(&scope, &Caller::new(&auth, ip), path.id)
        .await?;

    Ok(created(task))
}
