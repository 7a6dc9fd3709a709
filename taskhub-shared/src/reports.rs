/// Dashboard statistics and reports
///
/// Aggregations run in process over the organization's task list. The pure
/// functions take their inputs explicitly (including "now") so they can be
/// tested without a store; the async wrappers fetch and delegate.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::task::{Task, TaskPriority, TaskStatus};
use crate::models::user::User;
use crate::services::ServiceError;
use crate::store::Store;
use crate::tenancy::TenantScope;

pub const DEFAULT_REPORT_DAYS: u32 = 30;
pub const MAX_REPORT_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tasks: u64,
    pub open_tasks: u64,
    pub in_progress_tasks: u64,
    pub done_tasks: u64,
    pub overdue_tasks: u64,
    pub total_users: u64,

    /// Percentage of tasks done, rounded; 0 with no tasks
    pub completion_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD`, UTC
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub total: u64,
    pub open: u64,
    #[serde(rename = "in_progress")]
    pub in_progress: u64,
    pub review: u64,
    pub done: u64,
}

fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    task.status != TaskStatus::Done && task.due_date.is_some_and(|due| due < now)
}

pub fn dashboard_stats(tasks: &[Task], total_users: u64, now: DateTime<Utc>) -> DashboardStats {
    let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count() as u64;

    let total_tasks = tasks.len() as u64;
    let done_tasks = count(TaskStatus::Done);
    let completion_rate = if total_tasks == 0 {
        0
    } else {
        (done_tasks as f64 / total_tasks as f64 * 100.0).round() as u32
    };

    DashboardStats {
        total_tasks,
        open_tasks: count(TaskStatus::Open),
        in_progress_tasks: count(TaskStatus::InProgress),
        done_tasks,
        overdue_tasks: tasks.iter().filter(|t| is_overdue(t, now)).count() as u64,
        total_users,
        completion_rate,
    }
}

/// Task counts per status and per priority
///
/// Only values that occur are listed, in workflow (resp. severity) order.
pub fn distribution(tasks: &[Task]) -> Distribution {
    let by_status = TaskStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: tasks.iter().filter(|t| t.status == status).count() as u64,
        })
        .filter(|c| c.count > 0)
        .collect();

    let by_priority = TaskPriority::ALL
        .into_iter()
        .map(|priority| PriorityCount {
            priority,
            count: tasks.iter().filter(|t| t.priority == priority).count() as u64,
        })
        .filter(|c| c.count > 0)
        .collect();

    Distribution {
        by_status,
        by_priority,
    }
}

/// Tasks completed per UTC day over the last `days` days, oldest first
///
/// Days without completions are omitted.
pub fn completed_per_day(tasks: &[Task], now: DateTime<Utc>, days: u32) -> Vec<DailyCount> {
    let since = now - Duration::days(i64::from(days));

    let mut per_day: BTreeMap<_, u64> = BTreeMap::new();
    for completed_at in tasks.iter().filter_map(|t| t.completed_at) {
        if completed_at >= since {
            *per_day.entry(completed_at.date_naive()).or_default() += 1;
        }
    }

    per_day
        .into_iter()
        .map(|(day, count)| DailyCount {
            date: day.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

/// Assigned tasks per user, busiest first
///
/// Unassigned tasks and assignees that are no longer members are skipped.
pub fn team_workload(tasks: &[Task], users: &[User]) -> Vec<Workload> {
    let users: HashMap<Uuid, &User> = users.iter().map(|u| (u.id, u)).collect();
    let mut rows: HashMap<Uuid, Workload> = HashMap::new();

    for task in tasks {
        let Some(user) = task.assignee_id.and_then(|id| users.get(&id)) else {
            continue;
        };

        let row = rows.entry(user.id).or_insert_with(|| Workload {
            user_id: user.id,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            total: 0,
            open: 0,
            in_progress: 0,
            review: 0,
            done: 0,
        });

        row.total += 1;
        match task.status {
            TaskStatus::Open => row.open += 1,
            TaskStatus::InProgress => row.in_progress += 1,
            TaskStatus::Review => row.review += 1,
            TaskStatus::Done => row.done += 1,
        }
    }

    let mut rows: Vec<Workload> = rows.into_values().collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.user_name.cmp(&b.user_name)));
    rows
}

pub async fn dashboard(store: &dyn Store, scope: &TenantScope) -> Result<DashboardStats, ServiceError> {
    let (tasks, users) = futures::try_join!(store.all_tasks(scope), store.count_users(scope))?;
    Ok(dashboard_stats(&tasks, users.max(0) as u64, Utc::now()))
}

pub async fn task_distribution(store: &dyn Store, scope: &TenantScope) -> Result<Distribution, ServiceError> {
    Ok(distribution(&store.all_tasks(scope).await?))
}

pub async fn tasks_over_time(
    store: &dyn Store,
    scope: &TenantScope,
    days: u32,
) -> Result<Vec<DailyCount>, ServiceError> {
    let days = days.clamp(1, MAX_REPORT_DAYS);
    Ok(completed_per_day(&store.all_tasks(scope).await?, Utc::now(), days))
}

pub async fn workload(store: &dyn Store, scope: &TenantScope) -> Result<Vec<Workload>, ServiceError> {
    let (tasks, users) = futures::try_join!(store.all_tasks(scope), store.list_users(scope))?;
    Ok(team_workload(&tasks, &users))
}
