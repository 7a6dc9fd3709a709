/// Organization model and database operations
///
/// An organization is a tenant. Users, tasks, templates, notifications and
/// audit entries all belong to exactly one organization.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE org_plan AS ENUM ('free', 'pro', 'enterprise');
///
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(255) NOT NULL UNIQUE,
///     plan org_plan NOT NULL DEFAULT 'free',
///     max_users INTEGER NOT NULL DEFAULT 10,
///     max_tasks INTEGER NOT NULL DEFAULT 100,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::tenancy::TenantScope;

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "org_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrgPlan {
    Free,
    Pro,
    Enterprise,
}

impl OrgPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgPlan::Free => "free",
            OrgPlan::Pro => "pro",
            OrgPlan::Enterprise => "enterprise",
        }
    }
}

/// Per-organization limits
///
/// Stored but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrgSettings {
    pub max_users: i32,
    pub max_tasks: i32,
}

impl Default for OrgSettings {
    fn default() -> Self {
        Self {
            max_users: 10,
            max_tasks: 100,
        }
    }
}

/// Organization (tenant)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,

    /// URL-safe unique handle, derived from the name at registration
    pub slug: String,

    pub plan: OrgPlan,

    #[sqlx(flatten)]
    pub settings: OrgSettings,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an organization
#[derive(Debug, Clone)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: String,
}

/// Partial organization update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub plan: Option<OrgPlan>,
    pub max_users: Option<i32>,
    pub max_tasks: Option<i32>,
}

/// Derives an organization slug from its display name
///
/// Lowercases the name and replaces each run of whitespace with a single `-`.
///
/// ```
/// use taskhub_shared::models::organization::slugify;
///
/// assert_eq!(slugify("Acme Corp"), "acme-corp");
/// assert_eq!(slugify("  Big   Team "), "big-team");
/// ```
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

const COLUMNS: &str = "id, name, slug, plan, max_users, max_tasks, created_at, updated_at";

impl Organization {
    /// Creates an organization with default plan and settings
    pub async fn create(pool: &PgPool, data: CreateOrganization) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Organization>(&format!(
            "INSERT INTO organizations (name, slug) VALUES ($1, $2) RETURNING {COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.slug)
        .fetch_one(pool)
        .await
    }

    /// Finds an organization by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(&format!(
            "SELECT {COLUMNS} FROM organizations WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Loads the organization a scope belongs to
    pub async fn find(pool: &PgPool, scope: &TenantScope) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(&format!(
            "SELECT {COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(scope.org_id())
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update to the scope's organization
    pub async fn update(
        pool: &PgPool,
        scope: &TenantScope,
        data: UpdateOrganization,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(&format!(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                plan = COALESCE($3, plan),
                max_users = COALESCE($4, max_users),
                max_tasks = COALESCE($5, max_tasks),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(data.name)
        .bind(data.plan)
        .bind(data.max_users)
        .bind(data.max_tasks)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme"), "acme");
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("Acme\t Corp\nEU"), "acme-corp-eu");
    }

    #[test]
    fn test_default_settings() {
        let settings = OrgSettings::default();
        assert_eq!(settings.max_users, 10);
        assert_eq!(settings.max_tasks, 100);
    }

    #[test]
    fn test_plan_serialization() {
        assert_eq!(serde_json::to_value(OrgPlan::Enterprise).unwrap(), "enterprise");
        assert_eq!(OrgPlan::Pro.as_str(), "pro");
    }
}
