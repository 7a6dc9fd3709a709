/// Task activity timeline
///
/// The timeline of a task is not stored anywhere. It is rebuilt on demand
/// from the task's audit trail (before/after snapshots of each update) and
/// its comments:
///
/// | audit entry                                   | timeline item(s)                       |
/// |-----------------------------------------------|----------------------------------------|
/// | `create`                                      | `task_created`                         |
/// | `delete`                                      | `task_deleted`                         |
/// | `update` with `before` and `after` snapshots  | `status_changed` and/or `assignee_changed`, else `task_updated` |
/// | anything else                                 | `task_activity`                        |
///
/// Every comment becomes a `comment_added` item. Items are sorted oldest
/// first; at equal timestamps audit-derived items come before comments.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::audit_log::AuditLog;
use crate::models::comment::TaskComment;
use crate::models::task::TaskStatus;
use crate::models::user::UserSummary;
use crate::services::ServiceError;
use crate::store::Store;
use crate::tenancy::TenantScope;

/// Audit `resource` value for tasks
pub const TASK_RESOURCE: &str = "task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    TaskCreated,
    TaskDeleted,
    StatusChanged,
    AssigneeChanged,
    TaskUpdated,
    TaskActivity,
    CommentAdded,
}

/// One entry of a task's timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: ActivityKind,

    pub at: DateTime<Utc>,

    /// `None` for the system actor or a user who no longer exists
    pub actor: Option<UserSummary>,

    pub message: String,
    pub meta: JsonValue,
}

/// Display label of a status value; unknown values pass through
pub fn status_label(value: &str) -> String {
    TaskStatus::parse(value)
        .map(|status| status.label().to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Snapshot field as text; absent and null read as ""
fn field_text(snapshot: &JsonValue, field: &str) -> String {
    match snapshot.get(field) {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn field_or_null(snapshot: &JsonValue, field: &str) -> JsonValue {
    snapshot.get(field).cloned().unwrap_or(JsonValue::Null)
}

/// Items derived from one audit entry
fn audit_items(entry: &AuditLog, actor: Option<UserSummary>) -> Vec<ActivityItem> {
    let item = |kind, message: String, meta| ActivityItem {
        kind,
        at: entry.timestamp,
        actor: actor.clone(),
        message,
        meta,
    };
    let log_meta = json!({ "auditLogId": entry.id });

    let snapshots = entry.changes.as_ref().and_then(|changes| {
        match (changes.get("before"), changes.get("after")) {
            (Some(before), Some(after)) if before.is_object() && after.is_object() => {
                Some((before, after))
            }
            _ => None,
        }
    });

    match (entry.action.as_str(), snapshots) {
        ("create", _) => vec![item(
            ActivityKind::TaskCreated,
            "Created the task".to_string(),
            log_meta,
        )],
        ("delete", _) => vec![item(
            ActivityKind::TaskDeleted,
            "Deleted the task".to_string(),
            log_meta,
        )],
        ("update", Some((before, after))) => {
            let mut items = Vec::new();

            let status_after = field_text(after, "status");
            let status_before = field_text(before, "status");
            if !status_after.is_empty() && status_after != status_before {
                items.push(item(
                    ActivityKind::StatusChanged,
                    format!(
                        "Changed status from \"{}\" to \"{}\"",
                        status_label(&status_before),
                        status_label(&status_after)
                    ),
                    json!({
                        "before": field_or_null(before, "status"),
                        "after": status_after,
                        "auditLogId": entry.id,
                    }),
                ));
            }

            let assignee_after = field_text(after, "assigneeId");
            if !assignee_after.is_empty() && assignee_after != field_text(before, "assigneeId") {
                items.push(item(
                    ActivityKind::AssigneeChanged,
                    "Changed the assignee".to_string(),
                    json!({
                        "before": field_or_null(before, "assigneeId"),
                        "after": assignee_after,
                        "auditLogId": entry.id,
                    }),
                ));
            }

            if items.is_empty() {
                items.push(item(
                    ActivityKind::TaskUpdated,
                    "Updated the task".to_string(),
                    log_meta,
                ));
            }
            items
        }
        (action, _) => vec![item(
            ActivityKind::TaskActivity,
            format!("{} {}", action, entry.resource),
            log_meta,
        )],
    }
}

/// Merges a task's audit trail and comments into one timeline
///
/// Both inputs are expected in fetch order (oldest first). `users` resolves
/// actor ids; ids missing from it render as a null actor.
pub fn reconstruct(
    audit_trail: &[AuditLog],
    comments: &[TaskComment],
    users: &HashMap<Uuid, UserSummary>,
) -> Vec<ActivityItem> {
    let lookup = |id: Option<Uuid>| id.and_then(|id| users.get(&id).cloned());

    let mut items: Vec<ActivityItem> = audit_trail
        .iter()
        .flat_map(|entry| audit_items(entry, lookup(entry.user_id)))
        .collect();

    items.extend(comments.iter().map(|comment| ActivityItem {
        kind: ActivityKind::CommentAdded,
        at: comment.created_at,
        actor: lookup(Some(comment.user_id)),
        message: comment.body.clone(),
        meta: json!({ "commentId": comment.id }),
    }));

    // Stable: audit items were pushed first and keep their lead on ties
    items.sort_by_key(|item| item.at);
    items
}

/// Loads and rebuilds the timeline of one task
///
/// # Errors
///
/// `ServiceError::NotFound` when the task does not exist in `scope`; this is
/// checked before anything else is read.
pub async fn task_activity(
    store: &dyn Store,
    scope: &TenantScope,
    task_id: Uuid,
) -> Result<Vec<ActivityItem>, ServiceError> {
    store
        .find_task(scope, task_id)
        .await?
        .ok_or(ServiceError::NotFound("Task"))?;

    let (audit_trail, comments) = futures::try_join!(
        store.audit_trail(scope, TASK_RESOURCE, task_id),
        store.list_comments(scope, task_id),
    )?;

    let mut actor_ids: Vec<Uuid> = audit_trail
        .iter()
        .filter_map(|entry| entry.user_id)
        .chain(comments.iter().map(|comment| comment.user_id))
        .collect();
    actor_ids.sort();
    actor_ids.dedup();

    let users: HashMap<Uuid, UserSummary> = store
        .find_users(scope, &actor_ids)
        .await?
        .iter()
        .map(|user| (user.id, UserSummary::from(user)))
        .collect();

    Ok(reconstruct(&audit_trail, &comments, &users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn audit(action: &str, changes: Option<JsonValue>, user_id: Option<Uuid>, ts: i64) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            user_id,
            action: action.to_string(),
            resource: "task".to_string(),
            resource_id: Some(Uuid::new_v4()),
            changes,
            ip_address: "unknown".to_string(),
            timestamp: at(ts),
        }
    }

    fn comment(body: &str, user_id: Uuid, ts: i64) -> TaskComment {
        TaskComment {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            user_id,
            body: body.to_string(),
            created_at: at(ts),
        }
    }

    fn kinds(items: &[ActivityItem]) -> Vec<ActivityKind> {
        items.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_status_and_assignee_change_in_one_update() {
        let assignee = Uuid::new_v4();
        let entry = audit(
            "update",
            Some(json!({
                "before": { "status": "open", "assigneeId": null },
                "after": { "status": "in_progress", "assigneeId": assignee },
            })),
            None,
            0,
        );

        let items = reconstruct(&[entry.clone()], &[], &HashMap::new());
        assert_eq!(
            kinds(&items),
            vec![ActivityKind::StatusChanged, ActivityKind::AssigneeChanged]
        );
        assert_eq!(items[0].message, "Changed status from \"Open\" to \"In Progress\"");
        assert_eq!(items[0].meta["before"], "open");
        assert_eq!(items[0].meta["after"], "in_progress");
        assert_eq!(items[0].meta["auditLogId"], entry.id.to_string());
        assert_eq!(items[1].message, "Changed the assignee");
        assert_eq!(items[1].meta["before"], JsonValue::Null);
        assert_eq!(items[1].meta["after"], assignee.to_string());
        assert!(items[0].actor.is_none());
    }

    #[test]
    fn test_update_without_tracked_change_is_generic() {
        let same = json!({ "status": "open", "title": "A" });
        let entry = audit(
            "update",
            Some(json!({ "before": same, "after": { "status": "open", "title": "B" } })),
            None,
            0,
        );

        let items = reconstruct(&[entry], &[], &HashMap::new());
        assert_eq!(kinds(&items), vec![ActivityKind::TaskUpdated]);
        assert_eq!(items[0].message, "Updated the task");
    }

    #[test]
    fn test_unassigning_is_not_an_assignee_change() {
        let entry = audit(
            "update",
            Some(json!({
                "before": { "status": "open", "assigneeId": Uuid::new_v4() },
                "after": { "status": "open", "assigneeId": null },
            })),
            None,
            0,
        );

        let items = reconstruct(&[entry], &[], &HashMap::new());
        assert_eq!(kinds(&items), vec![ActivityKind::TaskUpdated]);
    }

    #[test]
    fn test_unknown_status_passes_through_and_missing_before_is_blank() {
        let entry = audit(
            "update",
            Some(json!({ "before": {}, "after": { "status": "archived" } })),
            None,
            0,
        );

        let items = reconstruct(&[entry], &[], &HashMap::new());
        assert_eq!(items[0].message, "Changed status from \"\" to \"archived\"");
        assert_eq!(items[0].meta["before"], JsonValue::Null);
    }

    #[test]
    fn test_other_actions_and_malformed_updates() {
        let entries = vec![
            audit("create", Some(json!({ "title": "A" })), None, 0),
            audit("created_recurring", None, None, 1),
            audit("update", Some(json!({ "title": "A" })), None, 2),
            audit("delete", None, None, 3),
        ];

        let items = reconstruct(&entries, &[], &HashMap::new());
        assert_eq!(
            kinds(&items),
            vec![
                ActivityKind::TaskCreated,
                ActivityKind::TaskActivity,
                ActivityKind::TaskActivity,
                ActivityKind::TaskDeleted,
            ]
        );
        assert_eq!(items[0].message, "Created the task");
        assert_eq!(items[1].message, "created_recurring task");
        assert_eq!(items[2].message, "update task");
        assert_eq!(items[3].message, "Deleted the task");
    }

    #[test]
    fn test_merge_order_and_ties() {
        let user = UserSummary {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        let users = HashMap::from([(user.id, user.clone())]);

        let entries = vec![
            audit("create", None, Some(user.id), 0),
            audit(
                "update",
                Some(json!({ "before": { "status": "open" }, "after": { "status": "done" } })),
                Some(user.id),
                10,
            ),
        ];
        let comments = vec![
            comment("first", user.id, 5),
            comment("same instant", user.id, 10),
            comment("last", user.id, 20),
        ];

        let items = reconstruct(&entries, &comments, &users);
        assert_eq!(
            kinds(&items),
            vec![
                ActivityKind::TaskCreated,
                ActivityKind::CommentAdded,
                ActivityKind::StatusChanged,
                ActivityKind::CommentAdded,
                ActivityKind::CommentAdded,
            ]
        );
        assert_eq!(items[3].message, "same instant");
        assert_eq!(items[1].meta["commentId"], comments[0].id.to_string());
        assert_eq!(items[0].actor.as_ref(), Some(&user));

        let timestamps: Vec<_> = items.iter().map(|i| i.at).collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted);
    }

    #[test]
    fn test_item_serialization() {
        let items = reconstruct(&[audit("create", None, None, 0)], &[], &HashMap::new());
        let json = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(json["type"], "task_created");
        assert_eq!(json["actor"], JsonValue::Null);
        assert!(json.get("at").is_some());
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label("review"), "Review");
        assert_eq!(status_label("blocked"), "blocked");
        assert_eq!(status_label(""), "");
    }
}
