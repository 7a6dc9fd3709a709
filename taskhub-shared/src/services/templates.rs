/// Task templates
///
/// Named blueprints that stamp ordinary tasks. Template names are unique
/// within an organization; a clash surfaces as [`ServiceError::Conflict`].

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{Caller, ServiceError};
use crate::activity::TASK_RESOURCE;
use crate::audit::{AuditEvent, AuditRecorder};
use crate::models::task::{NewTask, Task, TaskPriority, TaskStatus};
use crate::models::template::{NewTemplate, TaskTemplate};
use crate::notify::{Notice, NotificationDispatcher};
use crate::store::Store;
use crate::tenancy::TenantScope;

/// Audit `resource` value for templates
pub const TEMPLATE_RESOURCE: &str = "task_template";

#[derive(Debug, Clone, Default)]
pub struct TemplateInput {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
}

/// Partial template update; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Option<Uuid>>,
}

fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn Store>,
    audit: AuditRecorder,
    notifier: NotificationDispatcher,
}

impl TemplateService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            audit: AuditRecorder::new(store.clone()),
            notifier: NotificationDispatcher::new(store.clone()),
            store,
        }
    }

    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<TaskTemplate>, ServiceError> {
        Ok(self.store.list_templates(scope).await?)
    }

    pub async fn get(&self, scope: &TenantScope, id: Uuid) -> Result<TaskTemplate, ServiceError> {
        self.store
            .find_template(scope, id)
            .await?
            .ok_or(ServiceError::NotFound("Template"))
    }

    pub async fn create(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        input: TemplateInput,
    ) -> Result<TaskTemplate, ServiceError> {
        let template = self
            .store
            .create_template(
                scope,
                NewTemplate {
                    name: required(&input.name, "Name")?,
                    title: required(&input.title, "Title")?,
                    description: input.description,
                    priority: input.priority.unwrap_or_default(),
                    assignee_id: input.assignee_id,
                    created_by: caller.user_id,
                },
            )
            .await?;

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "create", TEMPLATE_RESOURCE)
                    .resource_id(template.id)
                    .changes(json!({ "name": template.name, "title": template.title }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(template)
    }

    pub async fn update(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        id: Uuid,
        input: TemplateUpdate,
    ) -> Result<TaskTemplate, ServiceError> {
        let mut template = self.get(scope, id).await?;

        if let Some(name) = input.name {
            template.name = required(&name, "Name")?;
        }
        if let Some(title) = input.title {
            template.title = required(&title, "Title")?;
        }
        if let Some(description) = input.description {
            template.description = description;
        }
        if let Some(priority) = input.priority {
            template.priority = priority;
        }
        if let Some(assignee_id) = input.assignee_id {
            template.assignee_id = assignee_id;
        }

        let saved = self
            .store
            .save_template(scope, &template)
            .await?
            .ok_or(ServiceError::NotFound("Template"))?;

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "update", TEMPLATE_RESOURCE)
                    .resource_id(saved.id)
                    .changes(json!({ "name": saved.name, "title": saved.title }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(saved)
    }

    pub async fn delete(&self, scope: &TenantScope, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
        let template = self.get(scope, id).await?;

        if !self.store.delete_template(scope, id).await? {
            return Err(ServiceError::NotFound("Template"));
        }

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "delete", TEMPLATE_RESOURCE)
                    .resource_id(id)
                    .changes(json!({ "name": template.name }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(())
    }

    /// Stamps a new open task from a template, owned by the caller
    pub async fn instantiate(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        template_id: Uuid,
    ) -> Result<Task, ServiceError> {
        let template = self.get(scope, template_id).await?;

        let task = self
            .store
            .create_task(
                scope,
                NewTask {
                    title: template.title.clone(),
                    description: template.description.clone().unwrap_or_default(),
                    status: TaskStatus::Open,
                    priority: template.priority,
                    assignee_id: template.assignee_id,
                    created_by: caller.user_id,
                    tags: Vec::new(),
                    due_date: None,
                    completed_at: None,
                    is_recurring: false,
                    recurrence: None,
                    next_recurrence: None,
                },
            )
            .await?;

        tracing::info!(
            org_id = %scope.org_id(),
            task_id = %task.id,
            template_id = %template.id,
            "Task created from template"
        );

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "create", TASK_RESOURCE)
                    .resource_id(task.id)
                    .changes(json!({ "title": task.title, "fromTemplate": template.name }))
                    .ip(caller.ip.clone()),
            )
            .await;

        if let Some(assignee_id) = task.assignee_id {
            self.notifier
                .notify(scope, Notice::task_assigned(&task, assignee_id, caller.user_id))
                .await;
        }

        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, TemplateService, TenantScope, Caller) {
        let store = Arc::new(MemoryStore::new());
        let service = TemplateService::new(store.clone());
        let scope = TenantScope::system(Uuid::new_v4());
        let caller = Caller {
            user_id: Uuid::new_v4(),
            ip: None,
        };
        (store, service, scope, caller)
    }

    fn input(name: &str) -> TemplateInput {
        TemplateInput {
            name: name.to_string(),
            title: "Weekly review".to_string(),
            description: Some("Go through the board".to_string()),
            priority: Some(TaskPriority::High),
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let (_, service, scope, caller) = setup();
        service.create(&scope, &caller, input("review")).await.unwrap();

        let err = service.create(&scope, &caller, input("review")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(err.to_string(), "A template with that name already exists");

        // Names are only unique per organization
        let other = TenantScope::system(Uuid::new_v4());
        assert!(service.create(&other, &caller, input("review")).await.is_ok());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (_, service, scope, caller) = setup();
        assert!(matches!(
            service.create(&scope, &caller, input("  ")).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_instantiate_copies_blueprint() {
        let (store, service, scope, caller) = setup();
        let template = service.create(&scope, &caller, input("review")).await.unwrap();

        let task = service.instantiate(&scope, &caller, template.id).await.unwrap();
        assert_eq!(task.title, "Weekly review");
        assert_eq!(task.description, "Go through the board");
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.created_by, caller.user_id);

        let trail = store.audit_trail(&scope, "task", task.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].changes.as_ref().unwrap()["fromTemplate"], "review");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_, service, scope, caller) = setup();
        let template = service.create(&scope, &caller, input("review")).await.unwrap();

        let updated = service
            .update(
                &scope,
                &caller,
                template.id,
                TemplateUpdate {
                    description: Some(None),
                    priority: Some(TaskPriority::Low),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "review");
        assert!(updated.description.is_none());
        assert_eq!(updated.priority, TaskPriority::Low);

        service.delete(&scope, &caller, template.id).await.unwrap();
        assert!(matches!(
            service.get(&scope, template.id).await,
            Err(ServiceError::NotFound("Template"))
        ));
        assert!(matches!(
            service.instantiate(&scope, &caller, template.id).await,
            Err(ServiceError::NotFound("Template"))
        ));
    }
}
