/// Audit recording
///
/// Every mutating operation appends one entry to the audit log after its
/// primary write succeeds. Recording is best effort: a failed append is
/// logged and reported as [`AuditOutcome::Failed`], never as an error, and
/// never undoes the write it describes.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use serde_json::json;
/// use taskhub_shared::audit::{AuditEvent, AuditRecorder};
/// use taskhub_shared::models::audit_log::AuditActor;
/// use taskhub_shared::store::{MemoryStore, Store};
/// use taskhub_shared::tenancy::TenantScope;
/// use uuid::Uuid;
///
/// # async fn example() {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// let recorder = AuditRecorder::new(store);
/// let scope = TenantScope::system(Uuid::new_v4());
///
/// let event = AuditEvent::new(AuditActor::User(Uuid::new_v4()), "delete", "task")
///     .resource_id(Uuid::new_v4())
///     .changes(json!({ "title": "Old task" }));
/// recorder.record(&scope, event).await;
/// # }
/// ```

use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit_log::{AuditActor, NewAuditLog};
use crate::store::Store;
use crate::tenancy::TenantScope;

/// Recorded when the client address is not known
pub const UNKNOWN_IP: &str = "unknown";

/// Recorded as the address of background jobs
pub const SYSTEM_IP: &str = "system";

/// Something worth auditing
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor: AuditActor,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub changes: Option<JsonValue>,
    pub ip_address: Option<String>,
}

impl AuditEvent {
    pub fn new(actor: AuditActor, action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            actor,
            action: action.into(),
            resource: resource.into(),
            resource_id: None,
            changes: None,
            ip_address: None,
        }
    }

    pub fn resource_id(mut self, id: Uuid) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn changes(mut self, changes: JsonValue) -> Self {
        self.changes = Some(changes);
        self
    }

    pub fn ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }
}

/// Result of a recording attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Recorded(Uuid),
    Failed,
}

/// Appends audit entries through a [`Store`]
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn Store>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends one entry in `scope`; never fails
    pub async fn record(&self, scope: &TenantScope, event: AuditEvent) -> AuditOutcome {
        let action = event.action.clone();
        let resource = event.resource.clone();

        let entry = NewAuditLog {
            actor: event.actor,
            action: event.action,
            resource: event.resource,
            resource_id: event.resource_id,
            changes: event.changes,
            ip_address: event
                .ip_address
                .filter(|ip| !ip.is_empty())
                .unwrap_or_else(|| UNKNOWN_IP.to_string()),
        };

        match self.store.append_audit(scope, entry).await {
            Ok(log) => AuditOutcome::Recorded(log.id),
            Err(e) => {
                tracing::warn!(
                    org_id = %scope.org_id(),
                    action = %action,
                    resource = %resource,
                    error = %e,
                    "Audit log failed"
                );
                AuditOutcome::Failed
            }
        }
    }
}
