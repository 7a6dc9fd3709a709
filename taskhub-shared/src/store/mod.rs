/// Persistence boundary
///
/// All reads and writes go through the [`Store`] trait. Every method that
/// touches tenant data takes a [`TenantScope`] as its first argument and
/// only sees rows of that organization; lookups outside the scope come back
/// as `None`, indistinguishable from a missing row.
///
/// Two implementations ship with the crate:
///
/// - [`PgStore`]: PostgreSQL via sqlx, used by the API server and worker
/// - [`MemoryStore`]: mutex-guarded maps with failure injection, used by tests
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_shared::store::{PgStore, Store};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::audit_log::{AuditFilter, AuditLog, NewAuditLog};
use crate::models::comment::{NewComment, TaskComment};
use crate::models::notification::{NewNotification, Notification};
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use crate::models::task::{NewTask, Task, TaskFilter};
use crate::models::template::{NewTemplate, TaskTemplate};
use crate::models::user::{CreateUser, NotificationPrefs, Role, User};
use crate::models::{Page, Pagination};
use crate::tenancy::TenantScope;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tenant-scoped persistence operations
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Cheap connectivity probe for health checks
    async fn ping(&self) -> StoreResult<()>;

    // Organizations

    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization>;

    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>>;

    async fn find_organization(&self, scope: &TenantScope) -> StoreResult<Option<Organization>>;

    async fn update_organization(
        &self,
        scope: &TenantScope,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>>;

    // Users

    /// Fails with [`StoreError::Conflict`] for a duplicate email in the scope
    async fn create_user(&self, scope: &TenantScope, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_email(&self, scope: &TenantScope, email: &str)
        -> StoreResult<Option<User>>;

    async fn find_user(&self, scope: &TenantScope, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_users(&self, scope: &TenantScope, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    async fn list_users(&self, scope: &TenantScope) -> StoreResult<Vec<User>>;

    async fn count_users(&self, scope: &TenantScope) -> StoreResult<i64>;

    async fn update_user_role(
        &self,
        scope: &TenantScope,
        id: Uuid,
        role: Role,
    ) -> StoreResult<Option<User>>;

    async fn update_notification_prefs(
        &self,
        scope: &TenantScope,
        id: Uuid,
        prefs: NotificationPrefs,
    ) -> StoreResult<Option<User>>;

    async fn update_last_login(&self, scope: &TenantScope, id: Uuid) -> StoreResult<()>;

    // Tasks

    async fn create_task(&self, scope: &TenantScope, data: NewTask) -> StoreResult<Task>;

    async fn find_task(&self, scope: &TenantScope, id: Uuid) -> StoreResult<Option<Task>>;

    async fn list_tasks(
        &self,
        scope: &TenantScope,
        filter: &TaskFilter,
        pagination: Pagination,
    ) -> StoreResult<Page<Task>>;

    async fn all_tasks(&self, scope: &TenantScope) -> StoreResult<Vec<Task>>;

    /// Last-write-wins update of every mutable field
    async fn save_task(&self, scope: &TenantScope, task: &Task) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, scope: &TenantScope, id: Uuid) -> StoreResult<bool>;

    /// Recurring tasks due on or before `today`, across all organizations
    async fn find_due_recurring_tasks(&self, today: NaiveDate) -> StoreResult<Vec<Task>>;

    async fn set_next_recurrence(
        &self,
        scope: &TenantScope,
        id: Uuid,
        next: NaiveDate,
    ) -> StoreResult<bool>;

    // Comments

    async fn create_comment(&self, scope: &TenantScope, data: NewComment)
        -> StoreResult<TaskComment>;

    /// Comments on a task, oldest first
    async fn list_comments(&self, scope: &TenantScope, task_id: Uuid)
        -> StoreResult<Vec<TaskComment>>;

    // Templates

    /// Fails with [`StoreError::Conflict`] for a duplicate name in the scope
    async fn create_template(&self, scope: &TenantScope, data: NewTemplate)
        -> StoreResult<TaskTemplate>;

    async fn find_template(&self, scope: &TenantScope, id: Uuid)
        -> StoreResult<Option<TaskTemplate>>;

    async fn list_templates(&self, scope: &TenantScope) -> StoreResult<Vec<TaskTemplate>>;

    async fn save_template(
        &self,
        scope: &TenantScope,
        template: &TaskTemplate,
    ) -> StoreResult<Option<TaskTemplate>>;

    async fn delete_template(&self, scope: &TenantScope, id: Uuid) -> StoreResult<bool>;

    // Notifications

    async fn create_notification(
        &self,
        scope: &TenantScope,
        data: NewNotification,
    ) -> StoreResult<Notification>;

    async fn list_notifications(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> StoreResult<Page<Notification>>;

    async fn count_unread_notifications(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
    ) -> StoreResult<i64>;

    async fn mark_notification_read(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<Notification>>;

    async fn mark_all_notifications_read(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
    ) -> StoreResult<u64>;

    // Audit log

    async fn append_audit(&self, scope: &TenantScope, data: NewAuditLog) -> StoreResult<AuditLog>;

    /// Newest first
    async fn list_audit_logs(
        &self,
        scope: &TenantScope,
        filter: &AuditFilter,
        pagination: Pagination,
    ) -> StoreResult<Page<AuditLog>>;

    /// History of one resource, oldest first
    async fn audit_trail(
        &self,
        scope: &TenantScope,
        resource: &str,
        resource_id: Uuid,
    ) -> StoreResult<Vec<AuditLog>>;
}
