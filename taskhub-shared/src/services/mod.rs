/// Domain operations
///
/// Services sit between the HTTP handlers and the [`Store`]: they validate
/// inputs that depend on stored state, perform the primary write, then run
/// the best-effort side effects (audit, notifications) in that order.
///
/// - [`tasks`]: task lifecycle, comments and recurrence bookkeeping
/// - [`templates`]: task templates and stamping tasks from them
/// - [`accounts`]: registration, login, roles, organization settings and
///   notification inbox writes
///
/// [`Store`]: crate::store::Store

pub mod accounts;
pub mod tasks;
pub mod templates;

use uuid::Uuid;

use crate::auth::authorization::AccessError;
use crate::auth::jwt::JwtError;
use crate::auth::middleware::AuthContext;
use crate::auth::password::PasswordError;
use crate::models::audit_log::AuditActor;
use crate::store::StoreError;

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input rejected
    #[error("{0}")]
    Validation(String),

    /// Entity missing from the caller's organization
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness rule violated
    #[error("{0}")]
    Conflict(String),

    /// Bad or missing credentials
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => ServiceError::Conflict(conflict_message(&constraint)),
            other => ServiceError::Store(other),
        }
    }
}

/// User-facing text for a violated uniqueness constraint
fn conflict_message(constraint: &str) -> String {
    match constraint {
        "users_org_email_unique" => "User already exists in this organization".to_string(),
        "task_templates_org_name_unique" => "A template with that name already exists".to_string(),
        "organizations_slug_key" => "Organization already exists".to_string(),
        _ => "Resource already exists".to_string(),
    }
}

/// Who is performing an operation, and from where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub ip: Option<String>,
}

impl Caller {
    pub fn new(auth: &AuthContext, ip: Option<String>) -> Self {
        Self {
            user_id: auth.user_id,
            ip,
        }
    }

    pub fn actor(&self) -> AuditActor {
        AuditActor::User(self.user_id)
    }
}
