/// Task comment model
///
/// Comments are immutable once written and feed the task activity timeline
/// alongside audit entries.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     body TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::tenancy::TenantScope;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: Uuid,
    pub org_id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,

    /// Trimmed, never empty
    pub body: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
}

const COLUMNS: &str = "id, org_id, task_id, user_id, body, created_at";

impl TaskComment {
    pub async fn create(
        pool: &PgPool,
        scope: &TenantScope,
        data: NewComment,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(&format!(
            r#"
            INSERT INTO task_comments (org_id, task_id, user_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.body)
        .fetch_one(pool)
        .await
    }

    /// Comments on a task, oldest first
    pub async fn list_for_task(
        pool: &PgPool,
        scope: &TenantScope,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(&format!(
            r#"
            SELECT {COLUMNS} FROM task_comments
            WHERE org_id = $1 AND task_id = $2
            ORDER BY created_at ASC, seq ASC
            "#
        ))
        .bind(scope.org_id())
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
