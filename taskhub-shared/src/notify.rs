/// In-app notifications
///
/// Task assignment and status changes notify the affected user. Delivery is
/// best effort: notices addressed to the user who triggered them are
/// dropped, and store failures are logged and reported as
/// [`NotifyOutcome::Failed`] without failing the request.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::task::Task;
use crate::store::Store;
use crate::tenancy::TenantScope;

pub const TASK_ASSIGNED_TITLE: &str = "New Task Assigned";
pub const TASK_STATUS_CHANGED_TITLE: &str = "Task Status Updated";

/// A notification about to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub task_id: Option<Uuid>,
    pub triggered_by: Uuid,
}

impl Notice {
    /// Tells `assignee` they now own `task`
    pub fn task_assigned(task: &Task, assignee: Uuid, triggered_by: Uuid) -> Self {
        Self {
            recipient_id: assignee,
            kind: NotificationKind::TaskAssigned,
            title: TASK_ASSIGNED_TITLE.to_string(),
            message: format!("You have been assigned to task \"{}\"", task.title),
            task_id: Some(task.id),
            triggered_by,
        }
    }

    /// Tells the task's creator its status moved from `old` to `new`
    pub fn task_status_changed(task: &Task, old: &str, new: &str, triggered_by: Uuid) -> Self {
        Self {
            recipient_id: task.created_by,
            kind: NotificationKind::TaskStatusChanged,
            title: TASK_STATUS_CHANGED_TITLE.to_string(),
            message: format!(
                "Task \"{}\" status changed from \"{}\" to \"{}\"",
                task.title, old, new
            ),
            task_id: Some(task.id),
            triggered_by,
        }
    }
}

/// Result of a delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent(Uuid),
    SkippedSelf,
    Failed,
}

/// Writes notifications through a [`Store`]
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn Store>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Delivers `notice` in `scope`; never fails
    pub async fn notify(&self, scope: &TenantScope, notice: Notice) -> NotifyOutcome {
        if notice.recipient_id == notice.triggered_by {
            return NotifyOutcome::SkippedSelf;
        }

        let kind = notice.kind;
        let recipient_id = notice.recipient_id;
        let data = NewNotification {
            recipient_id: notice.recipient_id,
            kind: notice.kind,
            title: notice.title,
            message: notice.message,
            task_id: notice.task_id,
            triggered_by: notice.triggered_by,
        };

        match self.store.create_notification(scope, data).await {
            Ok(notification) => {
                tracing::debug!(
                    org_id = %scope.org_id(),
                    recipient_id = %recipient_id,
                    kind = kind.as_str(),
                    "Notification sent"
                );
                NotifyOutcome::Sent(notification.id)
            }
            Err(e) => {
                tracing::warn!(
                    org_id = %scope.org_id(),
                    recipient_id = %recipient_id,
                    kind = kind.as_str(),
                    error = %e,
                    "Notification creation failed"
                );
                NotifyOutcome::Failed
            }
        }
    }
}
