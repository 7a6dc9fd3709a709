/// PostgreSQL store
///
/// Thin adapter from the [`Store`] trait onto the model-level SQL in
/// [`crate::models`]. sqlx errors are mapped to [`StoreError`] on the way out,
/// with unique violations surfacing as [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::audit_log::{AuditFilter, AuditLog, NewAuditLog};
use crate::models::comment::{NewComment, TaskComment};
use crate::models::notification::{NewNotification, Notification};
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use crate::models::task::{NewTask, Task, TaskFilter};
use crate::models::template::{NewTemplate, TaskTemplate};
use crate::models::user::{CreateUser, NotificationPrefs, Role, User};
use crate::models::{Page, Pagination};
use crate::tenancy::TenantScope;

/// [`Store`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await.map_err(StoreError::from)
    }

    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization> {
        Ok(Organization::create(&self.pool, data).await?)
    }

    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_slug(&self.pool, slug).await?)
    }

    async fn find_organization(&self, scope: &TenantScope) -> StoreResult<Option<Organization>> {
        Ok(Organization::find(&self.pool, scope).await?)
    }

    async fn update_organization(
        &self,
        scope: &TenantScope,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>> {
        Ok(Organization::update(&self.pool, scope, data).await?)
    }

    async fn create_user(&self, scope: &TenantScope, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, scope, data).await?)
    }

    async fn find_user_by_email(
        &self,
        scope: &TenantScope,
        email: &str,
    ) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, scope, email).await?)
    }

    async fn find_user(&self, scope: &TenantScope, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, scope, id).await?)
    }

    async fn find_users(&self, scope: &TenantScope, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(User::find_by_ids(&self.pool, scope, ids).await?)
    }

    async fn list_users(&self, scope: &TenantScope) -> StoreResult<Vec<User>> {
        Ok(User::list(&self.pool, scope).await?)
    }

    async fn count_users(&self, scope: &TenantScope) -> StoreResult<i64> {
        Ok(User::count(&self.pool, scope).await?)
    }

    async fn update_user_role(
        &self,
        scope: &TenantScope,
        id: Uuid,
        role: Role,
    ) -> StoreResult<Option<User>> {
        Ok(User::update_role(&self.pool, scope, id, role).await?)
    }

    async fn update_notification_prefs(
        &self,
        scope: &TenantScope,
        id: Uuid,
        prefs: NotificationPrefs,
    ) -> StoreResult<Option<User>> {
        Ok(User::update_notification_prefs(&self.pool, scope, id, prefs).await?)
    }

    async fn update_last_login(&self, scope: &TenantScope, id: Uuid) -> StoreResult<()> {
        Ok(User::update_last_login(&self.pool, scope, id).await?)
    }

    async fn create_task(&self, scope: &TenantScope, data: NewTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, scope, data).await?)
    }

    async fn find_task(&self, scope: &TenantScope, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, scope, id).await?)
    }

    async fn list_tasks(
        &self,
        scope: &TenantScope,
        filter: &TaskFilter,
        pagination: Pagination,
    ) -> StoreResult<Page<Task>> {
        Ok(Task::list(&self.pool, scope, filter, pagination).await?)
    }

    async fn all_tasks(&self, scope: &TenantScope) -> StoreResult<Vec<Task>> {
        Ok(Task::list_all(&self.pool, scope).await?)
    }

    async fn save_task(&self, scope: &TenantScope, task: &Task) -> StoreResult<Option<Task>> {
        Ok(Task::save(&self.pool, scope, task).await?)
    }

    async fn delete_task(&self, scope: &TenantScope, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, scope, id).await?)
    }

    async fn find_due_recurring_tasks(&self, today: NaiveDate) -> StoreResult<Vec<Task>> {
        Ok(Task::find_due_recurring(&self.pool, today).await?)
    }

    async fn set_next_recurrence(
        &self,
        scope: &TenantScope,
        id: Uuid,
        next: NaiveDate,
    ) -> StoreResult<bool> {
        Ok(Task::set_next_recurrence(&self.pool, scope, id, next).await?)
    }

    async fn create_comment(
        &self,
        scope: &TenantScope,
        data: NewComment,
    ) -> StoreResult<TaskComment> {
        Ok(TaskComment::create(&self.pool, scope, data).await?)
    }

    async fn list_comments(
        &self,
        scope: &TenantScope,
        task_id: Uuid,
    ) -> StoreResult<Vec<TaskComment>> {
        Ok(TaskComment::list_for_task(&self.pool, scope, task_id).await?)
    }

    async fn create_template(
        &self,
        scope: &TenantScope,
        data: NewTemplate,
    ) -> StoreResult<TaskTemplate> {
        Ok(TaskTemplate::create(&self.pool, scope, data).await?)
    }

    async fn find_template(
        &self,
        scope: &TenantScope,
        id: Uuid,
    ) -> StoreResult<Option<TaskTemplate>> {
        Ok(TaskTemplate::find_by_id(&self.pool, scope, id).await?)
    }

    async fn list_templates(&self, scope: &TenantScope) -> StoreResult<Vec<TaskTemplate>> {
        Ok(TaskTemplate::list(&self.pool, scope).await?)
    }

    async fn save_template(
        &self,
        scope: &TenantScope,
        template: &TaskTemplate,
    ) -> StoreResult<Option<TaskTemplate>> {
        Ok(TaskTemplate::save(&self.pool, scope, template).await?)
    }

    async fn delete_template(&self, scope: &TenantScope, id: Uuid) -> StoreResult<bool> {
        Ok(TaskTemplate::delete(&self.pool, scope, id).await?)
    }

    async fn create_notification(
        &self,
        scope: &TenantScope,
        data: NewNotification,
    ) -> StoreResult<Notification> {
        Ok(Notification::create(&self.pool, scope, data).await?)
    }

    async fn list_notifications(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> StoreResult<Page<Notification>> {
        Ok(
            Notification::list_for_recipient(&self.pool, scope, recipient_id, unread_only, pagination)
                .await?,
        )
    }

    async fn count_unread_notifications(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
    ) -> StoreResult<i64> {
        Ok(Notification::count_unread(&self.pool, scope, recipient_id).await?)
    }

    async fn mark_notification_read(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<Notification>> {
        Ok(Notification::mark_read(&self.pool, scope, recipient_id, id).await?)
    }

    async fn mark_all_notifications_read(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
    ) -> StoreResult<u64> {
        Ok(Notification::mark_all_read(&self.pool, scope, recipient_id).await?)
    }

    async fn append_audit(&self, scope: &TenantScope, data: NewAuditLog) -> StoreResult<AuditLog> {
        Ok(AuditLog::append(&self.pool, scope, data).await?)
    }

    async fn list_audit_logs(
        &self,
        scope: &TenantScope,
        filter: &AuditFilter,
        pagination: Pagination,
    ) -> StoreResult<Page<AuditLog>> {
        Ok(AuditLog::list(&self.pool, scope, filter, pagination).await?)
    }

    async fn audit_trail(
        &self,
        scope: &TenantScope,
        resource: &str,
        resource_id: Uuid,
    ) -> StoreResult<Vec<AuditLog>> {
        Ok(AuditLog::trail(&self.pool, scope, resource, resource_id).await?)
    }
}
