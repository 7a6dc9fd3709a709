/// Task template model
///
/// A template is a named, reusable blueprint for stamping new tasks. Names
/// are unique inside an organization.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_templates (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT task_templates_org_name_unique UNIQUE (org_id, name)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::TaskPriority;
use crate::tenancy::TenantScope;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
}

const COLUMNS: &str = "id, org_id, name, title, description, priority, assignee_id, created_by, \
                       created_at, updated_at";

impl TaskTemplate {
    /// Creates a template
    ///
    /// # Errors
    ///
    /// Unique violation on `task_templates_org_name_unique` for a duplicate
    /// name in the same organization.
    pub async fn create(
        pool: &PgPool,
        scope: &TenantScope,
        data: NewTemplate,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskTemplate>(&format!(
            r#"
            INSERT INTO task_templates (org_id, name, title, description, priority,
                                        assignee_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(data.name)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.assignee_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskTemplate>(&format!(
            "SELECT {COLUMNS} FROM task_templates WHERE org_id = $1 AND id = $2"
        ))
        .bind(scope.org_id())
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Templates sorted by name
    pub async fn list(pool: &PgPool, scope: &TenantScope) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskTemplate>(&format!(
            "SELECT {COLUMNS} FROM task_templates WHERE org_id = $1 ORDER BY name ASC"
        ))
        .bind(scope.org_id())
        .fetch_all(pool)
        .await
    }

    /// Writes back every mutable field
    pub async fn save(
        pool: &PgPool,
        scope: &TenantScope,
        template: &TaskTemplate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskTemplate>(&format!(
            r#"
            UPDATE task_templates
            SET name = $3, title = $4, description = $5, priority = $6, assignee_id = $7,
                updated_at = NOW()
            WHERE org_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.priority)
        .bind(template.assignee_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, scope: &TenantScope, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_templates WHERE org_id = $1 AND id = $2")
            .bind(scope.org_id())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
