/// In-app notification model
///
/// Notifications are addressed to a single recipient and are only ever read
/// or modified on behalf of that recipient.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_type AS ENUM ('task_assigned', 'task_status_changed');
///
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     recipient_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     kind notification_type NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     message TEXT NOT NULL,
///     task_id UUID,
///     triggered_by UUID NOT NULL,
///     read BOOLEAN NOT NULL DEFAULT FALSE,
///     read_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Page, Pagination};
use crate::tenancy::TenantScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskAssigned,
    TaskStatusChanged,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::TaskStatusChanged => "task_status_changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub org_id: Uuid,
    pub recipient_id: Uuid,

    #[serde(rename = "type")]
    pub kind: NotificationKind,

    pub title: String,
    pub message: String,
    pub task_id: Option<Uuid>,
    pub triggered_by: Uuid,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub task_id: Option<Uuid>,
    pub triggered_by: Uuid,
}

const COLUMNS: &str = "id, org_id, recipient_id, kind, title, message, task_id, triggered_by, \
                       read, read_at, created_at";

impl Notification {
    pub async fn create(
        pool: &PgPool,
        scope: &TenantScope,
        data: NewNotification,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (org_id, recipient_id, kind, title, message, task_id,
                                       triggered_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(data.recipient_id)
        .bind(data.kind)
        .bind(data.title)
        .bind(data.message)
        .bind(data.task_id)
        .bind(data.triggered_by)
        .fetch_one(pool)
        .await
    }

    /// A recipient's notifications, newest first
    pub async fn list_for_recipient(
        pool: &PgPool,
        scope: &TenantScope,
        recipient_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> Result<Page<Self>, sqlx::Error> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE org_id = $1 AND recipient_id = $2 AND (NOT $3 OR read = FALSE)
            "#,
        )
        .bind(scope.org_id())
        .bind(recipient_id)
        .bind(unread_only)
        .fetch_one(pool)
        .await?;

        let items = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {COLUMNS} FROM notifications
            WHERE org_id = $1 AND recipient_id = $2 AND (NOT $3 OR read = FALSE)
            ORDER BY created_at DESC, seq DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(scope.org_id())
        .bind(recipient_id)
        .bind(unread_only)
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

        Ok(Page { items, total })
    }

    pub async fn count_unread(
        pool: &PgPool,
        scope: &TenantScope,
        recipient_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE org_id = $1 AND recipient_id = $2 AND read = FALSE",
        )
        .bind(scope.org_id())
        .bind(recipient_id)
        .fetch_one(pool)
        .await
    }

    /// Marks one of the recipient's notifications as read
    ///
    /// `read_at` keeps its first value when called twice.
    pub async fn mark_read(
        pool: &PgPool,
        scope: &TenantScope,
        recipient_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications SET read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE org_id = $1 AND recipient_id = $2 AND id = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(recipient_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Marks all of the recipient's unread notifications as read
    pub async fn mark_all_read(
        pool: &PgPool,
        scope: &TenantScope,
        recipient_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET read = TRUE, read_at = NOW()
            WHERE org_id = $1 AND recipient_id = $2 AND read = FALSE
            "#,
        )
        .bind(scope.org_id())
        .bind(recipient_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
