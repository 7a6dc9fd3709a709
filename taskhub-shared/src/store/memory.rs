/// In-memory store
///
/// A [`Store`] kept in process memory, mirroring the PostgreSQL semantics
/// that callers rely on: tenant filtering, uniqueness constraints, ordering
/// and last-write-wins updates. Rows live in insertion-ordered vectors behind
/// a single mutex.
///
/// It also supports failure injection so tests can exercise best-effort side
/// effects and per-item isolation:
///
/// - [`MemoryStore::fail_audit_writes`]
/// - [`MemoryStore::fail_notification_writes`]
/// - [`MemoryStore::fail_writes_for_task`]
///
/// and a pinned clock ([`MemoryStore::pin_clock`]) for deterministic
/// timestamps.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::audit_log::{AuditFilter, AuditLog, NewAuditLog};
use crate::models::comment::{NewComment, TaskComment};
use crate::models::notification::{NewNotification, Notification};
use crate::models::organization::{
    CreateOrganization, OrgPlan, OrgSettings, Organization, UpdateOrganization,
};
use crate::models::task::{NewTask, Task, TaskFilter};
use crate::models::template::{NewTemplate, TaskTemplate};
use crate::models::user::{CreateUser, NotificationPrefs, Role, User};
use crate::models::{Page, Pagination};
use crate::tenancy::TenantScope;

#[derive(Default)]
struct Tables {
    organizations: Vec<Organization>,
    users: Vec<User>,
    tasks: Vec<Task>,
    comments: Vec<TaskComment>,
    templates: Vec<TaskTemplate>,
    notifications: Vec<Notification>,
    audit_logs: Vec<AuditLog>,
}

/// [`Store`] held in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pinned_now: Mutex<Option<DateTime<Utc>>>,
    fail_audit: AtomicBool,
    fail_notifications: AtomicBool,
    failing_tasks: Mutex<HashSet<Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every audit append fail until switched off
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Makes every notification insert fail until switched off
    pub fn fail_notification_writes(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Makes updates of one task fail (`save_task`, `set_next_recurrence`)
    pub fn fail_writes_for_task(&self, task_id: Uuid) {
        if let Ok(mut failing) = self.failing_tasks.lock() {
            failing.insert(task_id);
        }
    }

    /// Stamps every subsequent insert with `now` instead of the wall clock
    pub fn pin_clock(&self, now: Option<DateTime<Utc>>) {
        if let Ok(mut pinned) = self.pinned_now.lock() {
            *pinned = now;
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.pinned_now
            .lock()
            .ok()
            .and_then(|pinned| *pinned)
            .unwrap_or_else(Utc::now)
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn check_task_writable(&self, task_id: Uuid) -> StoreResult<()> {
        let failing = self
            .failing_tasks
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        if failing.contains(&task_id) {
            return Err(StoreError::Unavailable(format!(
                "injected write failure for task {}",
                task_id
            )));
        }
        Ok(())
    }
}

fn paginate<T: Clone>(items: Vec<T>, pagination: Pagination) -> Page<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit as usize)
        .collect();
    Page { items, total }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.tables().map(|_| ())
    }

    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization> {
        let now = self.now();
        let mut tables = self.tables()?;
        if tables.organizations.iter().any(|o| o.slug == data.slug) {
            return Err(StoreError::Conflict("organizations_slug_key".to_string()));
        }

        let org = Organization {
            id: Uuid::new_v4(),
            name: data.name,
            slug: data.slug,
            plan: OrgPlan::Free,
            settings: OrgSettings::default(),
            created_at: now,
            updated_at: now,
        };
        tables.organizations.push(org.clone());
        Ok(org)
    }

    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>> {
        let tables = self.tables()?;
        Ok(tables.organizations.iter().find(|o| o.slug == slug).cloned())
    }

    async fn find_organization(&self, scope: &TenantScope) -> StoreResult<Option<Organization>> {
        let tables = self.tables()?;
        Ok(tables
            .organizations
            .iter()
            .find(|o| o.id == scope.org_id())
            .cloned())
    }

    async fn update_organization(
        &self,
        scope: &TenantScope,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>> {
        let now = self.now();
        let mut tables = self.tables()?;
        let Some(org) = tables
            .organizations
            .iter_mut()
            .find(|o| o.id == scope.org_id())
        else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            org.name = name;
        }
        if let Some(plan) = data.plan {
            org.plan = plan;
        }
        if let Some(max_users) = data.max_users {
            org.settings.max_users = max_users;
        }
        if let Some(max_tasks) = data.max_tasks {
            org.settings.max_tasks = max_tasks;
        }
        org.updated_at = now;
        Ok(Some(org.clone()))
    }

    async fn create_user(&self, scope: &TenantScope, data: CreateUser) -> StoreResult<User> {
        let now = self.now();
        let mut tables = self.tables()?;
        if tables
            .users
            .iter()
            .any(|u| u.org_id == scope.org_id() && u.email == data.email)
        {
            return Err(StoreError::Conflict("users_org_email_unique".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            org_id: scope.org_id(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            notification_prefs: NotificationPrefs::default(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(
        &self,
        scope: &TenantScope,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .find(|u| u.org_id == scope.org_id() && u.email == email)
            .cloned())
    }

    async fn find_user(&self, scope: &TenantScope, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .find(|u| u.org_id == scope.org_id() && u.id == id)
            .cloned())
    }

    async fn find_users(&self, scope: &TenantScope, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .filter(|u| u.org_id == scope.org_id() && ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self, scope: &TenantScope) -> StoreResult<Vec<User>> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .filter(|u| u.org_id == scope.org_id())
            .cloned()
            .collect())
    }

    async fn count_users(&self, scope: &TenantScope) -> StoreResult<i64> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .filter(|u| u.org_id == scope.org_id())
            .count() as i64)
    }

    async fn update_user_role(
        &self,
        scope: &TenantScope,
        id: Uuid,
        role: Role,
    ) -> StoreResult<Option<User>> {
        let now = self.now();
        let mut tables = self.tables()?;
        Ok(tables
            .users
            .iter_mut()
            .find(|u| u.org_id == scope.org_id() && u.id == id)
            .map(|user| {
                user.role = role;
                user.updated_at = now;
                user.clone()
            }))
    }

    async fn update_notification_prefs(
        &self,
        scope: &TenantScope,
        id: Uuid,
        prefs: NotificationPrefs,
    ) -> StoreResult<Option<User>> {
        let now = self.now();
        let mut tables = self.tables()?;
        Ok(tables
            .users
            .iter_mut()
            .find(|u| u.org_id == scope.org_id() && u.id == id)
            .map(|user| {
                user.notification_prefs = prefs;
                user.updated_at = now;
                user.clone()
            }))
    }

    async fn update_last_login(&self, scope: &TenantScope, id: Uuid) -> StoreResult<()> {
        let now = self.now();
        let mut tables = self.tables()?;
        if let Some(user) = tables
            .users
            .iter_mut()
            .find(|u| u.org_id == scope.org_id() && u.id == id)
        {
            user.last_login_at = Some(now);
        }
        Ok(())
    }

    async fn create_task(&self, scope: &TenantScope, data: NewTask) -> StoreResult<Task> {
        let now = self.now();
        let mut tables = self.tables()?;
        let task = Task {
            id: Uuid::new_v4(),
            org_id: scope.org_id(),
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            assignee_id: data.assignee_id,
            created_by: data.created_by,
            tags: data.tags,
            due_date: data.due_date,
            completed_at: data.completed_at,
            is_recurring: data.is_recurring,
            recurrence: data.recurrence,
            next_recurrence: data.next_recurrence,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, scope: &TenantScope, id: Uuid) -> StoreResult<Option<Task>> {
        let tables = self.tables()?;
        Ok(tables
            .tasks
            .iter()
            .find(|t| t.org_id == scope.org_id() && t.id == id)
            .cloned())
    }

    async fn list_tasks(
        &self,
        scope: &TenantScope,
        filter: &TaskFilter,
        pagination: Pagination,
    ) -> StoreResult<Page<Task>> {
        let tables = self.tables()?;
        // Newest first: reverse insertion order
        let matching: Vec<Task> = tables
            .tasks
            .iter()
            .rev()
            .filter(|t| t.org_id == scope.org_id() && filter.matches(t))
            .cloned()
            .collect();
        Ok(paginate(matching, pagination))
    }

    async fn all_tasks(&self, scope: &TenantScope) -> StoreResult<Vec<Task>> {
        let tables = self.tables()?;
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| t.org_id == scope.org_id())
            .cloned()
            .collect())
    }

    async fn save_task(&self, scope: &TenantScope, task: &Task) -> StoreResult<Option<Task>> {
        self.check_task_writable(task.id)?;
        let now = self.now();
        let mut tables = self.tables()?;
        Ok(tables
            .tasks
            .iter_mut()
            .find(|t| t.org_id == scope.org_id() && t.id == task.id)
            .map(|stored| {
                let created_at = stored.created_at;
                let created_by = stored.created_by;
                *stored = Task {
                    org_id: scope.org_id(),
                    created_by,
                    created_at,
                    updated_at: now,
                    ..task.clone()
                };
                stored.clone()
            }))
    }

    async fn delete_task(&self, scope: &TenantScope, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        let before = tables.tasks.len();
        tables
            .tasks
            .retain(|t| !(t.org_id == scope.org_id() && t.id == id));
        let removed = tables.tasks.len() < before;
        if removed {
            tables
                .comments
                .retain(|c| !(c.org_id == scope.org_id() && c.task_id == id));
        }
        Ok(removed)
    }

    async fn find_due_recurring_tasks(&self, today: NaiveDate) -> StoreResult<Vec<Task>> {
        let tables = self.tables()?;
        let mut due: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| t.is_due(today))
            .cloned()
            .collect();
        due.sort_by_key(|t| t.next_recurrence);
        Ok(due)
    }

    async fn set_next_recurrence(
        &self,
        scope: &TenantScope,
        id: Uuid,
        next: NaiveDate,
    ) -> StoreResult<bool> {
        self.check_task_writable(id)?;
        let now = self.now();
        let mut tables = self.tables()?;
        Ok(tables
            .tasks
            .iter_mut()
            .find(|t| t.org_id == scope.org_id() && t.id == id)
            .map(|task| {
                task.next_recurrence = Some(next);
                task.updated_at = now;
            })
            .is_some())
    }

    async fn create_comment(
        &self,
        scope: &TenantScope,
        data: NewComment,
    ) -> StoreResult<TaskComment> {
        let now = self.now();
        let mut tables = self.tables()?;
        let comment = TaskComment {
            id: Uuid::new_v4(),
            org_id: scope.org_id(),
            task_id: data.task_id,
            user_id: data.user_id,
            body: data.body,
            created_at: now,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(
        &self,
        scope: &TenantScope,
        task_id: Uuid,
    ) -> StoreResult<Vec<TaskComment>> {
        let tables = self.tables()?;
        let mut comments: Vec<TaskComment> = tables
            .comments
            .iter()
            .filter(|c| c.org_id == scope.org_id() && c.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn create_template(
        &self,
        scope: &TenantScope,
        data: NewTemplate,
    ) -> StoreResult<TaskTemplate> {
        let now = self.now();
        let mut tables = self.tables()?;
        if tables
            .templates
            .iter()
            .any(|t| t.org_id == scope.org_id() && t.name == data.name)
        {
            return Err(StoreError::Conflict(
                "task_templates_org_name_unique".to_string(),
            ));
        }

        let template = TaskTemplate {
            id: Uuid::new_v4(),
            org_id: scope.org_id(),
            name: data.name,
            title: data.title,
            description: data.description,
            priority: data.priority,
            assignee_id: data.assignee_id,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        tables.templates.push(template.clone());
        Ok(template)
    }

    async fn find_template(
        &self,
        scope: &TenantScope,
        id: Uuid,
    ) -> StoreResult<Option<TaskTemplate>> {
        let tables = self.tables()?;
        Ok(tables
            .templates
            .iter()
            .find(|t| t.org_id == scope.org_id() && t.id == id)
            .cloned())
    }

    async fn list_templates(&self, scope: &TenantScope) -> StoreResult<Vec<TaskTemplate>> {
        let tables = self.tables()?;
        let mut templates: Vec<TaskTemplate> = tables
            .templates
            .iter()
            .filter(|t| t.org_id == scope.org_id())
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn save_template(
        &self,
        scope: &TenantScope,
        template: &TaskTemplate,
    ) -> StoreResult<Option<TaskTemplate>> {
        let now = self.now();
        let mut tables = self.tables()?;
        if tables.templates.iter().any(|t| {
            t.org_id == scope.org_id() && t.id != template.id && t.name == template.name
        }) {
            return Err(StoreError::Conflict(
                "task_templates_org_name_unique".to_string(),
            ));
        }

        Ok(tables
            .templates
            .iter_mut()
            .find(|t| t.org_id == scope.org_id() && t.id == template.id)
            .map(|stored| {
                stored.name = template.name.clone();
                stored.title = template.title.clone();
                stored.description = template.description.clone();
                stored.priority = template.priority;
                stored.assignee_id = template.assignee_id;
                stored.updated_at = now;
                stored.clone()
            }))
    }

    async fn delete_template(&self, scope: &TenantScope, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        let before = tables.templates.len();
        tables
            .templates
            .retain(|t| !(t.org_id == scope.org_id() && t.id == id));
        Ok(tables.templates.len() < before)
    }

    async fn create_notification(
        &self,
        scope: &TenantScope,
        data: NewNotification,
    ) -> StoreResult<Notification> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "injected notification write failure".to_string(),
            ));
        }

        let now = self.now();
        let mut tables = self.tables()?;
        let notification = Notification {
            id: Uuid::new_v4(),
            org_id: scope.org_id(),
            recipient_id: data.recipient_id,
            kind: data.kind,
            title: data.title,
            message: data.message,
            task_id: data.task_id,
            triggered_by: data.triggered_by,
            read: false,
            read_at: None,
            created_at: now,
        };
        tables.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> StoreResult<Page<Notification>> {
        let tables = self.tables()?;
        let matching: Vec<Notification> = tables
            .notifications
            .iter()
            .rev()
            .filter(|n| {
                n.org_id == scope.org_id()
                    && n.recipient_id == recipient_id
                    && (!unread_only || !n.read)
            })
            .cloned()
            .collect();
        Ok(paginate(matching, pagination))
    }

    async fn count_unread_notifications(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
    ) -> StoreResult<i64> {
        let tables = self.tables()?;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.org_id == scope.org_id() && n.recipient_id == recipient_id && !n.read)
            .count() as i64)
    }

    async fn mark_notification_read(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<Notification>> {
        let now = self.now();
        let mut tables = self.tables()?;
        Ok(tables
            .notifications
            .iter_mut()
            .find(|n| n.org_id == scope.org_id() && n.recipient_id == recipient_id && n.id == id)
            .map(|notification| {
                notification.read = true;
                notification.read_at.get_or_insert(now);
                notification.clone()
            }))
    }

    async fn mark_all_notifications_read(
        &self,
        scope: &TenantScope,
        recipient_id: Uuid,
    ) -> StoreResult<u64> {
        let now = self.now();
        let mut tables = self.tables()?;
        let mut updated = 0;
        for notification in tables.notifications.iter_mut().filter(|n| {
            n.org_id == scope.org_id() && n.recipient_id == recipient_id && !n.read
        }) {
            notification.read = true;
            notification.read_at = Some(now);
            updated += 1;
        }
        Ok(updated)
    }

    async fn append_audit(&self, scope: &TenantScope, data: NewAuditLog) -> StoreResult<AuditLog> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "injected audit write failure".to_string(),
            ));
        }

        let now = self.now();
        let mut tables = self.tables()?;
        let entry = AuditLog {
            id: Uuid::new_v4(),
            org_id: scope.org_id(),
            user_id: data.actor.user_id(),
            action: data.action,
            resource: data.resource,
            resource_id: data.resource_id,
            changes: data.changes,
            ip_address: data.ip_address,
            timestamp: now,
        };
        tables.audit_logs.push(entry.clone());
        Ok(entry)
    }

    async fn list_audit_logs(
        &self,
        scope: &TenantScope,
        filter: &AuditFilter,
        pagination: Pagination,
    ) -> StoreResult<Page<AuditLog>> {
        let tables = self.tables()?;
        let matching: Vec<AuditLog> = tables
            .audit_logs
            .iter()
            .rev()
            .filter(|e| e.org_id == scope.org_id() && filter.matches(e))
            .cloned()
            .collect();
        Ok(paginate(matching, pagination))
    }

    async fn audit_trail(
        &self,
        scope: &TenantScope,
        resource: &str,
        resource_id: Uuid,
    ) -> StoreResult<Vec<AuditLog>> {
        let tables = self.tables()?;
        let mut trail: Vec<AuditLog> = tables
            .audit_logs
            .iter()
            .filter(|e| {
                e.org_id == scope.org_id()
                    && e.resource == resource
                    && e.resource_id == Some(resource_id)
            })
            .cloned()
            .collect();
        trail.sort_by_key(|e| e.timestamp);
        Ok(trail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};

    fn new_task(title: &str, created_by: Uuid) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::Open,
            priority: TaskPriority::Medium,
            assignee_id: None,
            created_by,
            tags: Vec::new(),
            due_date: None,
            completed_at: None,
            is_recurring: false,
            recurrence: None,
            next_recurrence: None,
        }
    }

    #[tokio::test]
    async fn test_tasks_are_invisible_across_tenants() {
        let store = MemoryStore::new();
        let org_a = TenantScope::system(Uuid::new_v4());
        let org_b = TenantScope::system(Uuid::new_v4());

        let task = store
            .create_task(&org_a, new_task("secret", Uuid::new_v4()))
            .await
            .unwrap();

        assert!(store.find_task(&org_b, task.id).await.unwrap().is_none());
        assert!(!store.delete_task(&org_b, task.id).await.unwrap());
        assert!(store.save_task(&org_b, &task).await.unwrap().is_none());
        let page = store
            .list_tasks(&org_b, &TaskFilter::default(), Pagination::new(None, None, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 0);

        assert!(store.find_task(&org_a, task.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_within_org_only() {
        let store = MemoryStore::new();
        let org_a = TenantScope::system(Uuid::new_v4());
        let org_b = TenantScope::system(Uuid::new_v4());
        let data = CreateUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
        };

        store.create_user(&org_a, data.clone()).await.unwrap();
        assert!(matches!(
            store.create_user(&org_a, data.clone()).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store.create_user(&org_b, data).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_tasks_newest_first_with_total() {
        let store = MemoryStore::new();
        let scope = TenantScope::system(Uuid::new_v4());
        let creator = Uuid::new_v4();
        for title in ["one", "two", "three"] {
            store.create_task(&scope, new_task(title, creator)).await.unwrap();
        }

        let page = store
            .list_tasks(&scope, &TaskFilter::default(), Pagination::new(Some(1), Some(2), 20))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let titles: Vec<_> = page.items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn test_save_task_keeps_creator() {
        let store = MemoryStore::new();
        let scope = TenantScope::system(Uuid::new_v4());
        let creator = Uuid::new_v4();
        let mut task = store.create_task(&scope, new_task("a", creator)).await.unwrap();

        task.created_by = Uuid::new_v4();
        task.title = "b".to_string();
        let saved = store.save_task(&scope, &task).await.unwrap().unwrap();
        assert_eq!(saved.title, "b");
        assert_eq!(saved.created_by, creator);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        let scope = TenantScope::system(Uuid::new_v4());
        let task = store
            .create_task(&scope, new_task("a", Uuid::new_v4()))
            .await
            .unwrap();

        store.fail_writes_for_task(task.id);
        assert!(store.save_task(&scope, &task).await.is_err());
        assert!(store
            .set_next_recurrence(&scope, task.id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .await
            .is_err());

        store.fail_audit_writes(true);
        let audit = NewAuditLog {
            actor: crate::models::audit_log::AuditActor::System,
            action: "create".to_string(),
            resource: "task".to_string(),
            resource_id: Some(task.id),
            changes: None,
            ip_address: "system".to_string(),
        };
        assert!(store.append_audit(&scope, audit.clone()).await.is_err());
        store.fail_audit_writes(false);
        assert!(store.append_audit(&scope, audit).await.is_ok());
    }

    #[tokio::test]
    async fn test_mark_read_is_per_recipient() {
        let store = MemoryStore::new();
        let scope = TenantScope::system(Uuid::new_v4());
        let recipient = Uuid::new_v4();
        let notification = store
            .create_notification(
                &scope,
                NewNotification {
                    recipient_id: recipient,
                    kind: crate::models::notification::NotificationKind::TaskAssigned,
                    title: "New Task Assigned".to_string(),
                    message: "m".to_string(),
                    task_id: None,
                    triggered_by: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();

        let other = Uuid::new_v4();
        assert!(store
            .mark_notification_read(&scope, other, notification.id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.count_unread_notifications(&scope, recipient).await.unwrap(), 1);

        let read = store
            .mark_notification_read(&scope, recipient, notification.id)
            .await
            .unwrap()
            .unwrap();
        assert!(read.read);
        assert!(read.read_at.is_some());
        assert_eq!(store.count_unread_notifications(&scope, recipient).await.unwrap(), 0);
    }
}
