/// End-to-end task lifecycle over the in-memory store
///
/// Exercises the services together: writes, their audit trail, the
/// notifications they trigger and the activity timeline rebuilt from both.

mod common;

use chrono::{TimeZone, Utc};
use common::TestOrg;
use taskhub_shared::activity::{task_activity, ActivityKind};
use taskhub_shared::auth::authorization::{authorize, AccessError, Action, Resource};
use taskhub_shared::auth::middleware::AuthContext;
use taskhub_shared::models::audit_log::AuditFilter;
use taskhub_shared::models::notification::NotificationKind;
use taskhub_shared::models::task::TaskStatus;
use taskhub_shared::models::Pagination;
use taskhub_shared::services::tasks::{CreateTaskInput, UpdateTaskInput};
use taskhub_shared::services::templates::TemplateInput;
use taskhub_shared::services::ServiceError;
use taskhub_shared::store::Store;
use taskhub_shared::tenancy::TenantScope;
use uuid::Uuid;

fn kinds(items: &[taskhub_shared::activity::ActivityItem]) -> Vec<ActivityKind> {
    items.iter().map(|item| item.kind).collect()
}

#[tokio::test]
async fn test_timeline_follows_task_history() {
    let org = TestOrg::new().await;
    let admin = org.caller(&org.admin);
    let member = org.caller(&org.member);

    let task = org
        .tasks
        .create(
            &org.scope,
            &admin,
            CreateTaskInput {
                title: "Prepare release".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    org.tasks
        .update(
            &org.scope,
            &admin,
            task.id,
            UpdateTaskInput {
                assignee_id: Some(Some(org.member.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    org.tasks
        .update(
            &org.scope,
            &member,
            task.id,
            UpdateTaskInput {
                status: Some(TaskStatus::Review),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    org.tasks
        .update(
            &org.scope,
            &member,
            task.id,
            UpdateTaskInput {
                description: Some("Changelog and tag".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    org.tasks
        .add_comment(&org.scope, &member, task.id, "Ready for a look")
        .await
        .unwrap();

    let timeline = task_activity(org.store.as_ref(), &org.scope, task.id)
        .await
        .unwrap();

    assert_eq!(
        kinds(&timeline),
        vec![
            ActivityKind::TaskCreated,
            ActivityKind::AssigneeChanged,
            ActivityKind::StatusChanged,
            ActivityKind::TaskUpdated,
            ActivityKind::CommentAdded,
        ]
    );
    assert_eq!(timeline[2].message, "Changed status from \"Open\" to \"Review\"");
    assert_eq!(timeline[2].actor.as_ref().unwrap().id, org.member.id);
    assert_eq!(timeline[4].message, "Ready for a look");
    assert!(timeline.windows(2).all(|pair| pair[0].at <= pair[1].at));
}

#[tokio::test]
async fn test_timeline_ties_put_audit_entries_before_comments() {
    let org = TestOrg::new().await;
    let admin = org.caller(&org.admin);
    org.store
        .pin_clock(Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));

    let task = org
        .tasks
        .create(
            &org.scope,
            &admin,
            CreateTaskInput {
                title: "Same instant".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    org.tasks
        .add_comment(&org.scope, &admin, task.id, "first")
        .await
        .unwrap();
    org.tasks
        .update(
            &org.scope,
            &admin,
            task.id,
            UpdateTaskInput {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let timeline = task_activity(org.store.as_ref(), &org.scope, task.id)
        .await
        .unwrap();
    assert_eq!(
        kinds(&timeline),
        vec![
            ActivityKind::TaskCreated,
            ActivityKind::StatusChanged,
            ActivityKind::CommentAdded,
        ]
    );
}

#[tokio::test]
async fn test_timeline_of_foreign_task_is_not_found() {
    let org = TestOrg::new().await;
    let other = TestOrg::with_store(org.store.clone()).await;

    let task = org
        .tasks
        .create(
            &org.scope,
            &org.caller(&org.admin),
            CreateTaskInput {
                title: "Ours".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        task_activity(org.store.as_ref(), &other.scope, task.id).await,
        Err(ServiceError::NotFound("Task"))
    ));
    assert!(matches!(
        other
            .tasks
            .add_comment(&other.scope, &other.caller(&other.admin), task.id, "hi")
            .await,
        Err(ServiceError::NotFound("Task"))
    ));
}

#[tokio::test]
async fn test_path_org_mismatch_is_rejected_before_permissions() {
    let org = TestOrg::new().await;
    let auth = AuthContext::new(org.admin.id, org.scope.org_id(), "admin", &org.admin.email);

    assert!(matches!(
        TenantScope::for_path(&auth, Uuid::new_v4()),
        Err(AccessError::CrossTenant)
    ));
    assert!(authorize(&auth, Action::Delete, Resource::Tasks).is_ok());

    let member = AuthContext::new(org.member.id, org.scope.org_id(), "member", &org.member.email);
    assert!(matches!(
        authorize(&member, Action::Delete, Resource::Tasks),
        Err(AccessError::Denied { .. })
    ));
}

#[tokio::test]
async fn test_audit_outage_leaves_primary_writes_intact() {
    let org = TestOrg::new().await;
    let admin = org.caller(&org.admin);
    org.store.fail_audit_writes(true);

    let task = org
        .tasks
        .create(
            &org.scope,
            &admin,
            CreateTaskInput {
                title: "Unaudited".to_string(),
                assignee_id: Some(org.member.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    org.tasks.delete(&org.scope, &admin, task.id).await.unwrap();

    assert!(org.store.find_task(&org.scope, task.id).await.unwrap().is_none());
    assert_eq!(
        org.store
            .count_unread_notifications(&org.scope, org.member.id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_assigning_unassigned_task_notifies_assignee_once() {
    let org = TestOrg::new().await;
    let admin = org.caller(&org.admin);

    let task = org
        .tasks
        .create(
            &org.scope,
            &admin,
            CreateTaskInput {
                title: "Triage inbox".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(task.assignee_id.is_none());

    let assign = || UpdateTaskInput {
        assignee_id: Some(Some(org.member.id)),
        ..Default::default()
    };
    org.tasks.update(&org.scope, &admin, task.id, assign()).await.unwrap();
    // Same assignee again is not a change
    org.tasks.update(&org.scope, &admin, task.id, assign()).await.unwrap();

    let received = org
        .store
        .list_notifications(&org.scope, org.member.id, false, Pagination::new(None, None, 20))
        .await
        .unwrap();
    assert_eq!(received.total, 1);
    assert_eq!(received.items[0].kind, NotificationKind::TaskAssigned);
    assert_eq!(received.items[0].task_id, Some(task.id));
    assert_eq!(received.items[0].triggered_by, org.admin.id);

    let sent = org
        .store
        .list_notifications(&org.scope, org.admin.id, false, Pagination::new(None, None, 20))
        .await
        .unwrap();
    assert_eq!(sent.total, 0);
}

#[tokio::test]
async fn test_audit_outage_during_update_keeps_the_change() {
    let org = TestOrg::new().await;
    let admin = org.caller(&org.admin);
    let member = org.caller(&org.member);

    let task = org
        .tasks
        .create(
            &org.scope,
            &admin,
            CreateTaskInput {
                title: "Ship it".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    org.store.fail_audit_writes(true);
    let updated = org
        .tasks
        .update(
            &org.scope,
            &member,
            task.id,
            UpdateTaskInput {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::Done);

    let stored = org.store.find_task(&org.scope, task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Done);
    assert!(stored.completed_at.is_some());

    // The creator still hears about the status change
    assert_eq!(
        org.store
            .count_unread_notifications(&org.scope, org.admin.id)
            .await
            .unwrap(),
        1
    );

    org.store.fail_audit_writes(false);
    let logs = org
        .store
        .list_audit_logs(&org.scope, &AuditFilter::default(), Pagination::new(None, None, 50))
        .await
        .unwrap();
    assert_eq!(logs.total, 1);
    assert_eq!(logs.items[0].action, "create");
}

#[tokio::test]
async fn test_audit_log_records_ip_and_newest_first() {
    let org = TestOrg::new().await;
    let admin = org.caller(&org.admin);

    let template = org
        .templates
        .create(
            &org.scope,
            &admin,
            TemplateInput {
                name: "onboarding".to_string(),
                title: "Onboard new hire".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let task = org
        .templates
        .instantiate(&org.scope, &admin, template.id)
        .await
        .unwrap();

    let logs = org
        .store
        .list_audit_logs(&org.scope, &AuditFilter::default(), Pagination::new(None, None, 50))
        .await
        .unwrap();
    assert_eq!(logs.total, 2);
    assert_eq!(logs.items[0].resource, "task");
    assert_eq!(logs.items[0].resource_id, Some(task.id));
    assert_eq!(logs.items[1].resource, "task_template");
    assert!(logs.items.iter().all(|entry| entry.ip_address == "127.0.0.1"));

    let only_templates = org
        .store
        .list_audit_logs(
            &org.scope,
            &AuditFilter {
                resource: Some("task_template".to_string()),
                ..Default::default()
            },
            Pagination::new(None, None, 50),
        )
        .await
        .unwrap();
    assert_eq!(only_templates.total, 1);
}
