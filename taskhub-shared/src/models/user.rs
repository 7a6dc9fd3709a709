/// User model and database operations
///
/// Users belong to exactly one organization. Email addresses are unique per
/// organization, so the same address may exist in several tenants.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'manager', 'member');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     notify_email BOOLEAN NOT NULL DEFAULT TRUE,
///     notify_in_app BOOLEAN NOT NULL DEFAULT TRUE,
///     last_login_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_org_email_unique UNIQUE (org_id, email)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::tenancy::TenantScope;

/// Role of a user inside their organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "member" => Ok(Role::Member),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

/// Delivery channels a user has opted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPrefs {
    #[sqlx(rename = "notify_email")]
    pub email: bool,

    #[sqlx(rename = "notify_in_app")]
    pub in_app: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email: true,
            in_app: true,
        }
    }
}

/// User account
///
/// The password hash is never serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: Role,

    #[sqlx(flatten)]
    pub notification_prefs: NotificationPrefs,

    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public identity of a user, as embedded in activity items and reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,

    /// Argon2id hash, never the plaintext password
    pub password_hash: String,

    pub role: Role,
}

const COLUMNS: &str = "id, org_id, name, email, password_hash, role, notify_email, notify_in_app, \
                       last_login_at, created_at, updated_at";

impl User {
    /// Creates a user in the scope's organization
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_org_email_unique` when the
    /// email is already registered in this organization.
    pub async fn create(
        pool: &PgPool,
        scope: &TenantScope,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (org_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by email inside the scope
    pub async fn find_by_email(
        pool: &PgPool,
        scope: &TenantScope,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE org_id = $1 AND email = $2"
        ))
        .bind(scope.org_id())
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by id inside the scope
    pub async fn find_by_id(
        pool: &PgPool,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE org_id = $1 AND id = $2"
        ))
        .bind(scope.org_id())
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Loads several users at once; unknown ids are skipped
    pub async fn find_by_ids(
        pool: &PgPool,
        scope: &TenantScope,
        ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE org_id = $1 AND id = ANY($2)"
        ))
        .bind(scope.org_id())
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Lists the organization's users, oldest first
    pub async fn list(pool: &PgPool, scope: &TenantScope) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE org_id = $1 ORDER BY created_at ASC"
        ))
        .bind(scope.org_id())
        .fetch_all(pool)
        .await
    }

    /// Counts the organization's users
    pub async fn count(pool: &PgPool, scope: &TenantScope) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE org_id = $1")
            .bind(scope.org_id())
            .fetch_one(pool)
            .await
    }

    /// Changes a user's role
    pub async fn update_role(
        pool: &PgPool,
        scope: &TenantScope,
        id: Uuid,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET role = $3, updated_at = NOW()
            WHERE org_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await
    }

    /// Replaces a user's notification preferences
    pub async fn update_notification_prefs(
        pool: &PgPool,
        scope: &TenantScope,
        id: Uuid,
        prefs: NotificationPrefs,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET notify_email = $3, notify_in_app = $4, updated_at = NOW()
            WHERE org_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(id)
        .bind(prefs.email)
        .bind(prefs.in_app)
        .fetch_optional(pool)
        .await
    }

    /// Records a successful login
    pub async fn update_last_login(
        pool: &PgPool,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE org_id = $1 AND id = $2")
            .bind(scope.org_id())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
