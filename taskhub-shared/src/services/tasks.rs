/// Task lifecycle
///
/// Creates, updates and deletes tasks inside a tenant scope, keeping the
/// recurrence schedule and completion timestamp consistent, and records
/// every change in the audit log as before/after snapshots. Those snapshots
/// are what [`crate::activity`] later diffs into a timeline, so their shape
/// (camelCase fields, status as its wire string) is part of the contract.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{Caller, ServiceError};
use crate::activity::TASK_RESOURCE;
use crate::audit::{AuditEvent, AuditRecorder};
use crate::models::comment::{NewComment, TaskComment};
use crate::models::task::{NewTask, Recurrence, Task, TaskPriority, TaskStatus};
use crate::notify::{Notice, NotificationDispatcher};
use crate::recurrence;
use crate::store::Store;
use crate::tenancy::TenantScope;

/// Longest accepted task title, in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Audit `resource` value for comments
pub const COMMENT_RESOURCE: &str = "task_comment";

/// Fields of a new task; the creator comes from the caller
#[derive(Debug, Clone, Default)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence: Option<Recurrence>,
}

/// Partial update; `None` keeps the current value
///
/// Nullable fields use `Option<Option<_>>` so that "clear" (`Some(None)`)
/// differs from "leave alone" (`None`).
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub is_recurring: Option<bool>,
    pub recurrence: Option<Option<Recurrence>>,
}

/// Audited view of a task's editable fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskSnapshot<'a> {
    title: &'a str,
    description: &'a str,
    status: TaskStatus,
    priority: TaskPriority,
    assignee_id: Option<Uuid>,
    tags: &'a [String],
    due_date: Option<DateTime<Utc>>,
    is_recurring: bool,
    recurrence: Option<Recurrence>,
}

impl<'a> From<&'a Task> for TaskSnapshot<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            title: &task.title,
            description: &task.description,
            status: task.status,
            priority: task.priority,
            assignee_id: task.assignee_id,
            tags: &task.tags,
            due_date: task.due_date,
            is_recurring: task.is_recurring,
            recurrence: task.recurrence,
        }
    }
}

fn normalize_title(title: &str) -> Result<String, ServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

fn require_cadence(is_recurring: bool, recurrence: Option<Recurrence>) -> Result<(), ServiceError> {
    if is_recurring && recurrence.is_none() {
        return Err(ServiceError::Validation(
            "Recurrence is required for recurring tasks".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
    audit: AuditRecorder,
    notifier: NotificationDispatcher,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            audit: AuditRecorder::new(store.clone()),
            notifier: NotificationDispatcher::new(store.clone()),
            store,
        }
    }

    /// Fetches one task
    pub async fn get(&self, scope: &TenantScope, id: Uuid) -> Result<Task, ServiceError> {
        self.store
            .find_task(scope, id)
            .await?
            .ok_or(ServiceError::NotFound("Task"))
    }

    async fn check_assignee(&self, scope: &TenantScope, assignee_id: Option<Uuid>) -> Result<(), ServiceError> {
        let Some(assignee_id) = assignee_id else {
            return Ok(());
        };
        match self.store.find_user(scope, assignee_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::Validation(
                "Assignee must be a member of the organization".to_string(),
            )),
        }
    }

    /// Creates a task owned by the caller
    ///
    /// A recurring task gets its first occurrence one cadence unit after
    /// today. Assigning someone else notifies them.
    pub async fn create(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        input: CreateTaskInput,
    ) -> Result<Task, ServiceError> {
        let title = normalize_title(&input.title)?;
        require_cadence(input.is_recurring, input.recurrence)?;
        self.check_assignee(scope, input.assignee_id).await?;

        let status = input.status.unwrap_or(TaskStatus::Open);
        let recurrence = input.recurrence.filter(|_| input.is_recurring);
        let next_recurrence =
            recurrence.map(|cadence| recurrence::first_occurrence(recurrence::today(), cadence));

        let task = self
            .store
            .create_task(
                scope,
                NewTask {
                    title,
                    description: input.description.unwrap_or_default(),
                    status,
                    priority: input.priority.unwrap_or_default(),
                    assignee_id: input.assignee_id,
                    created_by: caller.user_id,
                    tags: input.tags,
                    due_date: input.due_date,
                    completed_at: (status == TaskStatus::Done).then(Utc::now),
                    is_recurring: input.is_recurring,
                    recurrence,
                    next_recurrence,
                },
            )
            .await?;

        tracing::info!(org_id = %scope.org_id(), task_id = %task.id, "Task created");

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "create", TASK_RESOURCE)
                    .resource_id(task.id)
                    .changes(json!({
                        "title": task.title,
                        "status": task.status,
                        "priority": task.priority,
                        "isRecurring": task.is_recurring,
                        "recurrence": task.recurrence,
                    }))
                    .ip(caller.ip.clone()),
            )
            .await;

        if let Some(assignee_id) = task.assignee_id {
            self.notifier
                .notify(scope, Notice::task_assigned(&task, assignee_id, caller.user_id))
                .await;
        }

        Ok(task)
    }

    /// Applies a partial update
    ///
    /// Last write wins. `completed_at` is stamped on the first move to
    /// `done` and kept afterwards. Changing the cadence, or turning
    /// recurrence on, reschedules from today; turning it off clears the
    /// schedule.
    pub async fn update(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        id: Uuid,
        input: UpdateTaskInput,
    ) -> Result<Task, ServiceError> {
        let current = self.get(scope, id).await?;
        let mut task = current.clone();

        if let Some(title) = input.title {
            task.title = normalize_title(&title)?;
        }
        if let Some(description) = input.description {
            task.description = description;
        }
        if let Some(status) = input.status {
            task.status = status;
        }
        if let Some(priority) = input.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = input.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(tags) = input.tags {
            task.tags = tags;
        }
        if let Some(due_date) = input.due_date {
            task.due_date = due_date;
        }
        if let Some(is_recurring) = input.is_recurring {
            task.is_recurring = is_recurring;
        }
        if let Some(recurrence) = input.recurrence {
            task.recurrence = recurrence;
        }

        if task.assignee_id != current.assignee_id {
            self.check_assignee(scope, task.assignee_id).await?;
        }

        if task.is_recurring {
            require_cadence(true, task.recurrence)?;
            if task.next_recurrence.is_none() || task.recurrence != current.recurrence {
                task.next_recurrence = task
                    .recurrence
                    .map(|cadence| recurrence::first_occurrence(recurrence::today(), cadence));
            }
        } else {
            task.recurrence = None;
            task.next_recurrence = None;
        }

        if task.status == TaskStatus::Done && task.completed_at.is_none() {
            task.completed_at = Some(Utc::now());
        }

        let saved = self
            .store
            .save_task(scope, &task)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        tracing::info!(org_id = %scope.org_id(), task_id = %saved.id, "Task updated");

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "update", TASK_RESOURCE)
                    .resource_id(saved.id)
                    .changes(json!({
                        "before": TaskSnapshot::from(&current),
                        "after": TaskSnapshot::from(&saved),
                    }))
                    .ip(caller.ip.clone()),
            )
            .await;

        if let Some(assignee_id) = saved.assignee_id.filter(|_| saved.assignee_id != current.assignee_id) {
            self.notifier
                .notify(scope, Notice::task_assigned(&saved, assignee_id, caller.user_id))
                .await;
        }

        if saved.status != current.status {
            self.notifier
                .notify(
                    scope,
                    Notice::task_status_changed(
                        &saved,
                        current.status.as_str(),
                        saved.status.as_str(),
                        caller.user_id,
                    ),
                )
                .await;
        }

        Ok(saved)
    }

    /// Deletes a task and its comments
    pub async fn delete(&self, scope: &TenantScope, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
        let task = self.get(scope, id).await?;

        if !self.store.delete_task(scope, id).await? {
            return Err(ServiceError::NotFound("Task"));
        }

        tracing::info!(org_id = %scope.org_id(), task_id = %id, "Task deleted");

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "delete", TASK_RESOURCE)
                    .resource_id(id)
                    .changes(json!({ "title": task.title }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(())
    }

    /// Comments on a task, oldest first
    pub async fn comments(&self, scope: &TenantScope, task_id: Uuid) -> Result<Vec<TaskComment>, ServiceError> {
        self.get(scope, task_id).await?;
        Ok(self.store.list_comments(scope, task_id).await?)
    }

    /// Adds a comment; the body is trimmed and must not be blank
    pub async fn add_comment(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        task_id: Uuid,
        body: &str,
    ) -> Result<TaskComment, ServiceError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ServiceError::Validation("Comment body is required".to_string()));
        }

        self.get(scope, task_id).await?;

        let comment = self
            .store
            .create_comment(
                scope,
                NewComment {
                    task_id,
                    user_id: caller.user_id,
                    body: body.to_string(),
                },
            )
            .await?;

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "create", COMMENT_RESOURCE)
                    .resource_id(comment.id)
                    .changes(json!({ "taskId": task_id, "body": comment.body }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(comment)
    }
}
