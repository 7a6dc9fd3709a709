/// Audit log model
///
/// The audit log is append-only: rows are inserted and read, never updated
/// or deleted by the application. It is the only historical record the
/// task activity timeline is rebuilt from.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audit_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     user_id UUID,                      -- NULL: system actor
///     action VARCHAR(64) NOT NULL,
///     resource VARCHAR(64) NOT NULL,
///     resource_id UUID,
///     changes JSONB,
///     ip_address VARCHAR(64) NOT NULL DEFAULT 'unknown',
///     timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Page, Pagination};
use crate::tenancy::TenantScope;

/// Serialized value of `userId` for entries written by background jobs
pub const SYSTEM_ACTOR: &str = "system";

/// Who performed an audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditActor {
    User(Uuid),
    System,
}

impl AuditActor {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuditActor::User(id) => Some(*id),
            AuditActor::System => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    pub org_id: Uuid,

    /// `None` for the system actor, serialized as `"system"`
    #[serde(serialize_with = "serialize_actor")]
    pub user_id: Option<Uuid>,

    pub action: String,
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub changes: Option<JsonValue>,
    pub ip_address: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditLog {
    pub fn actor(&self) -> AuditActor {
        match self.user_id {
            Some(id) => AuditActor::User(id),
            None => AuditActor::System,
        }
    }
}

fn serialize_actor<S: Serializer>(user_id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error> {
    match user_id {
        Some(id) => serializer.collect_str(id),
        None => serializer.serialize_str(SYSTEM_ACTOR),
    }
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub actor: AuditActor,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub changes: Option<JsonValue>,
    pub ip_address: String,
}

/// Optional filters for the audit log listing
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub resource: Option<String>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditLog) -> bool {
        self.action.as_deref().map_or(true, |a| a == entry.action)
            && self.resource.as_deref().map_or(true, |r| r == entry.resource)
    }
}

const COLUMNS: &str =
    "id, org_id, user_id, action, resource, resource_id, changes, ip_address, timestamp";

impl AuditLog {
    pub async fn append(
        pool: &PgPool,
        scope: &TenantScope,
        data: NewAuditLog,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            INSERT INTO audit_logs (org_id, user_id, action, resource, resource_id, changes,
                                    ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(data.actor.user_id())
        .bind(data.action)
        .bind(data.resource)
        .bind(data.resource_id)
        .bind(data.changes)
        .bind(data.ip_address)
        .fetch_one(pool)
        .await
    }

    /// Audit entries, newest first
    pub async fn list(
        pool: &PgPool,
        scope: &TenantScope,
        filter: &AuditFilter,
        pagination: Pagination,
    ) -> Result<Page<Self>, sqlx::Error> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM audit_logs
            WHERE org_id = $1 AND ($2::text IS NULL OR action = $2)
              AND ($3::text IS NULL OR resource = $3)
            "#,
        )
        .bind(scope.org_id())
        .bind(filter.action.as_deref())
        .bind(filter.resource.as_deref())
        .fetch_one(pool)
        .await?;

        let items = sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            SELECT {COLUMNS} FROM audit_logs
            WHERE org_id = $1 AND ($2::text IS NULL OR action = $2)
              AND ($3::text IS NULL OR resource = $3)
            ORDER BY timestamp DESC, seq DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(scope.org_id())
        .bind(filter.action.as_deref())
        .bind(filter.resource.as_deref())
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

        Ok(Page { items, total })
    }

    /// Full history of one resource, oldest first
    pub async fn trail(
        pool: &PgPool,
        scope: &TenantScope,
        resource: &str,
        resource_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            SELECT {COLUMNS} FROM audit_logs
            WHERE org_id = $1 AND resource = $2 AND resource_id = $3
            ORDER BY timestamp ASC, seq ASC
            "#
        ))
        .bind(scope.org_id())
        .bind(resource)
        .bind(resource_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user_id: Option<Uuid>) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            user_id,
            action: "created_recurring".to_string(),
            resource: "task".to_string(),
            resource_id: Some(Uuid::new_v4()),
            changes: None,
            ip_address: "system".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_system_actor_serialization() {
        let json = serde_json::to_value(entry(None)).unwrap();
        assert_eq!(json["userId"], SYSTEM_ACTOR);
        assert_eq!(entry(None).actor(), AuditActor::System);
    }

    #[test]
    fn test_user_actor_serialization() {
        let user_id = Uuid::new_v4();
        let json = serde_json::to_value(entry(Some(user_id))).unwrap();
        assert_eq!(json["userId"], user_id.to_string());
        assert_eq!(entry(Some(user_id)).actor(), AuditActor::User(user_id));
    }

    #[test]
    fn test_filter_matches() {
        let e = entry(None);
        assert!(AuditFilter::default().matches(&e));
        assert!(AuditFilter {
            resource: Some("task".to_string()),
            ..Default::default()
        }
        .matches(&e));
        assert!(!AuditFilter {
            action: Some("delete".to_string()),
            ..Default::default()
        }
        .matches(&e));
    }
}
