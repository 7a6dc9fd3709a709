/// End-to-end tests for task, template, notification and report routes

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};

async fn create_task(ctx: &TestApp, token: &str, body: Value) -> Value {
    let (status, body) = ctx.post(&ctx.org_uri("/tasks"), Some(token), body).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
    body["data"].clone()
}

#[tokio::test]
async fn test_task_lifecycle_over_http() {
    let ctx = TestApp::new().await;
    let admin = ctx.token(&ctx.admin);
    let member = ctx.token(&ctx.member);

    let task = create_task(
        &ctx,
        &admin,
        json!({
            "title": "  Write release notes  ",
            "assigneeId": ctx.member.id,
            "tags": ["docs"],
        }),
    )
    .await;
    assert_eq!(task["title"], "Write release notes");
    assert_eq!(task["status"], "open");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["createdBy"], ctx.admin.id.to_string());
    assert!(task["completedAt"].is_null());
    let task_uri = ctx.org_uri(&format!("/tasks/{}", task["id"].as_str().unwrap()));

    let (status, body) = ctx
        .put(&task_uri, Some(&member), json!({"status": "done"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "done");
    assert!(body["data"]["completedAt"].is_string());
    assert_eq!(body["data"]["tags"], json!(["docs"]));

    let (status, body) = ctx
        .post(&format!("{}/comments", task_uri), Some(&member), json!({"body": "  Shipped  "}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["body"], "Shipped");

    let (status, body) = ctx
        .post(&format!("{}/comments", task_uri), Some(&member), json!({"body": ""}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Comment body is required");

    let (status, body) = ctx.get(&format!("{}/comments", task_uri), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = ctx.get(&format!("{}/activity", task_uri), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["task_created", "status_changed", "comment_added"]);
    assert_eq!(body["data"][1]["message"], "Changed status from \"Open\" to \"Done\"");
    assert_eq!(body["data"][1]["actor"]["name"], "member");
    assert_eq!(body["data"][2]["message"], "Shipped");
}

#[tokio::test]
async fn test_partial_update_and_clearing_fields() {
    let ctx = TestApp::new().await;
    let admin = ctx.token(&ctx.admin);

    let task = create_task(
        &ctx,
        &admin,
        json!({
            "title": "Quarterly review",
            "priority": "high",
            "assigneeId": ctx.manager.id,
            "dueDate": "2030-01-15T09:00:00Z",
        }),
    )
    .await;
    let task_uri = ctx.org_uri(&format!("/tasks/{}", task["id"].as_str().unwrap()));

    // Omitted fields stay as they are
    let (_, body) = ctx
        .put(&task_uri, Some(&admin), json!({"description": "Prepare slides"}))
        .await;
    assert_eq!(body["data"]["priority"], "high");
    assert_eq!(body["data"]["assigneeId"], ctx.manager.id.to_string());
    assert_eq!(body["data"]["description"], "Prepare slides");

    // Explicit null clears
    let (status, body) = ctx
        .put(&task_uri, Some(&admin), json!({"assigneeId": null, "dueDate": null}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["assigneeId"].is_null());
    assert!(body["data"]["dueDate"].is_null());
    assert_eq!(body["data"]["title"], "Quarterly review");
}

#[tokio::test]
async fn test_task_listing_filters_and_pagination() {
    let ctx = TestApp::new().await;
    let admin = ctx.token(&ctx.admin);

    create_task(&ctx, &admin, json!({"title": "Fix login bug", "priority": "critical"})).await;
    create_task(&ctx, &admin, json!({"title": "Update docs", "description": "Login section"})).await;
    create_task(
        &ctx,
        &admin,
        json!({"title": "Plan offsite", "status": "in_progress", "assigneeId": ctx.member.id}),
    )
    .await;

    let (status, body) = ctx.get(&ctx.org_uri("/tasks?limit=2"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"], json!({"page": 1, "limit": 2, "total": 3}));
    // Newest first
    assert_eq!(body["data"][0]["title"], "Plan offsite");

    let (_, body) = ctx.get(&ctx.org_uri("/tasks?limit=2&page=2"), Some(&admin)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["page"], 2);

    let (_, body) = ctx.get(&ctx.org_uri("/tasks?search=LOGIN"), Some(&admin)).await;
    assert_eq!(body["meta"]["total"], 2);

    let (_, body) = ctx.get(&ctx.org_uri("/tasks?status=in_progress"), Some(&admin)).await;
    assert_eq!(body["meta"]["total"], 1);

    let (_, body) = ctx.get(&ctx.org_uri("/tasks?priority=critical"), Some(&admin)).await;
    assert_eq!(body["data"][0]["title"], "Fix login bug");

    let (_, body) = ctx
        .get(&ctx.org_uri(&format!("/tasks?assigneeId={}", ctx.member.id)), Some(&admin))
        .await;
    assert_eq!(body["meta"]["total"], 1);
}

#[tokio::test]
async fn test_assignment_and_status_notifications() {
    let ctx = TestApp::new().await;
    let admin = ctx.token(&ctx.admin);
    let member = ctx.token(&ctx.member);

    let task = create_task(
        &ctx,
        &admin,
        json!({"title": "Triage inbox", "assigneeId": ctx.member.id}),
    )
    .await;
    // Self-assignment does not notify
    create_task(&ctx, &member, json!({"title": "Own task", "assigneeId": ctx.member.id})).await;

    let (status, body) = ctx.get(&ctx.org_uri("/notifications"), Some(&member)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["type"], "task_assigned");
    assert_eq!(body["data"][0]["taskId"], task["id"]);
    assert_eq!(body["data"][0]["read"], false);
    let notification_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (_, body) = ctx.get(&ctx.org_uri("/notifications/unread-count"), Some(&member)).await;
    assert_eq!(body["data"]["count"], 1);

    // The assignee moves the task; the creator hears about it
    ctx.put(
        &ctx.org_uri(&format!("/tasks/{}", task["id"].as_str().unwrap())),
        Some(&member),
        json!({"status": "review"}),
    )
    .await;
    let (_, body) = ctx.get(&ctx.org_uri("/notifications"), Some(&admin)).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["type"], "task_status_changed");

    // Recipients only ever see their own notifications
    let (status, body) = ctx
        .put(
            &ctx.org_uri(&format!("/notifications/{}/read", notification_id)),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Notification not found");

    let (status, body) = ctx
        .put(
            &ctx.org_uri(&format!("/notifications/{}/read", notification_id)),
            Some(&member),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["read"], true);

    let (_, body) = ctx
        .get(&ctx.org_uri("/notifications?unreadOnly=true"), Some(&member))
        .await;
    assert_eq!(body["meta"]["total"], 0);

    let (status, body) = ctx
        .put(&ctx.org_uri("/notifications/mark-all-read"), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["modifiedCount"], 1);
}

#[tokio::test]
async fn test_notification_preferences() {
    let ctx = TestApp::new().await;
    let member = ctx.token(&ctx.member);
    let uri = ctx.org_uri("/notifications/preferences");

    let (status, body) = ctx.get(&uri, Some(&member)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"email": true, "inApp": true}));

    let (status, body) = ctx.put(&uri, Some(&member), json!({"email": false})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"email": false, "inApp": true}));

    let (_, body) = ctx.get(&uri, Some(&ctx.token(&ctx.admin))).await;
    assert_eq!(body["data"]["email"], true);
}

#[tokio::test]
async fn test_templates_over_http() {
    let ctx = TestApp::new().await;
    let admin = ctx.token(&ctx.admin);
    let member = ctx.token(&ctx.member);

    let (status, body) = ctx
        .post(
            &ctx.org_uri("/task-templates"),
            Some(&admin),
            json!({"name": "Bug report", "title": "Investigate bug", "priority": "high", "assigneeId": ctx.member.id}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let template_uri = ctx.org_uri(&format!(
        "/task-templates/{}",
        body["data"]["id"].as_str().unwrap()
    ));

    let (status, body) = ctx
        .post(
            &ctx.org_uri("/task-templates"),
            Some(&admin),
            json!({"name": "Bug report", "title": "Another"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A template with that name already exists");

    let (status, body) = ctx
        .post(&format!("{}/create-task", template_uri), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], "Investigate bug");
    assert_eq!(body["data"]["priority"], "high");
    assert_eq!(body["data"]["status"], "open");
    assert_eq!(body["data"]["createdBy"], ctx.admin.id.to_string());

    let (_, body) = ctx.get(&ctx.org_uri("/notifications"), Some(&member)).await;
    assert_eq!(body["data"][0]["type"], "task_assigned");

    let (status, body) = ctx
        .put(&template_uri, Some(&admin), json!({"title": "Investigate defect"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Investigate defect");
    assert_eq!(body["data"]["name"], "Bug report");

    let (status, _) = ctx.delete(&template_uri, Some(&member)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.delete(&template_uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Template deleted successfully");

    let (status, body) = ctx.get(&template_uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Template not found");
}

#[tokio::test]
async fn test_audit_log_listing() {
    let ctx = TestApp::new().await;
    let admin = ctx.token(&ctx.admin);

    let task = create_task(&ctx, &admin, json!({"title": "Audited"})).await;
    ctx.put(
        &ctx.org_uri(&format!("/tasks/{}", task["id"].as_str().unwrap())),
        Some(&admin),
        json!({"priority": "low"}),
    )
    .await;

    let (status, body) = ctx.get(&ctx.org_uri("/audit-logs"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["limit"], 50);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["data"][0]["action"], "update");
    assert_eq!(body["data"][0]["changes"]["before"]["priority"], "medium");
    assert_eq!(body["data"][0]["changes"]["after"]["priority"], "low");
    assert_eq!(body["data"][1]["action"], "create");
    assert_eq!(body["data"][1]["userId"], ctx.admin.id.to_string());

    let (_, body) = ctx
        .get(&ctx.org_uri("/audit-logs?action=create&resource=task"), Some(&admin))
        .await;
    assert_eq!(body["meta"]["total"], 1);
}

#[tokio::test]
async fn test_dashboard_and_reports() {
    let ctx = TestApp::new().await;
    let admin = ctx.token(&ctx.admin);

    create_task(&ctx, &admin, json!({"title": "Open one", "assigneeId": ctx.member.id})).await;
    create_task(
        &ctx,
        &admin,
        json!({"title": "Done one", "status": "done", "assigneeId": ctx.member.id}),
    )
    .await;
    create_task(
        &ctx,
        &admin,
        json!({"title": "Late", "dueDate": "2000-01-01T00:00:00Z", "priority": "high"}),
    )
    .await;
    create_task(&ctx, &admin, json!({"title": "Underway", "status": "in_progress"})).await;

    let member = ctx.token(&ctx.member);
    let (status, body) = ctx.get(&ctx.org_uri("/dashboard/stats"), Some(&member)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "totalTasks": 4,
            "openTasks": 2,
            "inProgressTasks": 1,
            "doneTasks": 1,
            "overdueTasks": 1,
            "totalUsers": 3,
            "completionRate": 25,
        })
    );

    let (_, body) = ctx.get(&ctx.org_uri("/reports/task-distribution"), Some(&member)).await;
    assert_eq!(
        body["data"]["byStatus"],
        json!([
            {"status": "open", "count": 2},
            {"status": "in_progress", "count": 1},
            {"status": "done", "count": 1},
        ])
    );
    assert_eq!(
        body["data"]["byPriority"],
        json!([{"priority": "medium", "count": 3}, {"priority": "high", "count": 1}])
    );

    let (_, body) = ctx
        .get(&ctx.org_uri("/reports/tasks-over-time?days=7"), Some(&member))
        .await;
    let days = body["data"].as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["count"], 1);
    assert_eq!(days[0]["date"].as_str().unwrap().len(), "YYYY-MM-DD".len());

    let (_, body) = ctx.get(&ctx.org_uri("/reports/team-workload"), Some(&member)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["userName"], "member");
    assert_eq!(body["data"][0]["total"], 2);
    assert_eq!(body["data"][0]["open"], 1);
    assert_eq!(body["data"][0]["done"], 1);
}
