/// Task model and database operations
///
/// Tasks are the core entity of TaskHub. A task may be recurring, in which
/// case the scheduler stamps a fresh copy every time `next_recurrence` falls
/// due and advances the date by one cadence unit.
///
/// # Status
///
/// ```text
/// open → in_progress → review → done
/// ```
///
/// Any status may be set from any other; the workflow is advisory.
/// `completed_at` is stamped the first time a task reaches `done` and is
/// never cleared afterwards.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('open', 'in_progress', 'review', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'critical');
/// CREATE TYPE recurrence AS ENUM ('daily', 'weekly', 'monthly');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'open',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     due_date TIMESTAMPTZ,
///     completed_at TIMESTAMPTZ,
///     is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
///     recurrence recurrence,
///     next_recurrence DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Page, Pagination};
use crate::tenancy::TenantScope;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

/// Cadence of a recurring task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurrence", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }
}

/// Task
///
/// Serialized with camelCase keys; the same JSON shape is stored in audit
/// snapshots, which the activity timeline later diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub org_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,

    /// Creator; never changes after insert
    pub created_by: Uuid,

    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,

    /// First time the task reached `done`
    pub completed_at: Option<DateTime<Utc>>,

    pub is_recurring: bool,
    pub recurrence: Option<Recurrence>,

    /// Next date (UTC calendar) on which the scheduler spawns an instance
    pub next_recurrence: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether the scheduler should spawn an instance on `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_recurring && self.next_recurrence.is_some_and(|next| next <= today)
    }
}

/// Fully resolved input for inserting a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence: Option<Recurrence>,
    pub next_recurrence: Option<NaiveDate>,
}

impl NewTask {
    /// Plain one-off task instance copied from a recurring source
    ///
    /// Carries over title, description, priority, assignee, creator and tags.
    /// The instance starts open, with no due date and no recurrence.
    pub fn instance_of(source: &Task) -> Self {
        Self {
            title: source.title.clone(),
            description: source.description.clone(),
            status: TaskStatus::Open,
            priority: source.priority,
            assignee_id: source.assignee_id,
            created_by: source.created_by,
            tags: source.tags.clone(),
            due_date: None,
            completed_at: None,
            is_recurring: false,
            recurrence: None,
            next_recurrence: None,
        }
    }
}

/// Optional filters for task listings
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,

    /// Case-insensitive substring of title or description
    pub search: Option<String>,
}

impl TaskFilter {
    /// In-process evaluation, equivalent to the SQL `WHERE` clause
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|status| status != task.status) {
            return false;
        }
        if self.priority.is_some_and(|priority| priority != task.priority) {
            return false;
        }
        if self.assignee_id.is_some() && self.assignee_id != task.assignee_id {
            return false;
        }
        match self.search.as_deref() {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    fn like_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }
}

/// Escapes LIKE metacharacters so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

const COLUMNS: &str = "id, org_id, title, description, status, priority, assignee_id, created_by, \
                       tags, due_date, completed_at, is_recurring, recurrence, next_recurrence, \
                       created_at, updated_at";

const FILTER: &str = r#"
    org_id = $1
    AND ($2::task_status IS NULL OR status = $2)
    AND ($3::task_priority IS NULL OR priority = $3)
    AND ($4::uuid IS NULL OR assignee_id = $4)
    AND ($5::text IS NULL OR title ILIKE $5 OR description ILIKE $5)
"#;

impl Task {
    /// Inserts a task into the scope's organization
    pub async fn create(
        pool: &PgPool,
        scope: &TenantScope,
        data: NewTask,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (org_id, title, description, status, priority, assignee_id,
                               created_by, tags, due_date, completed_at, is_recurring,
                               recurrence, next_recurrence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assignee_id)
        .bind(data.created_by)
        .bind(data.tags)
        .bind(data.due_date)
        .bind(data.completed_at)
        .bind(data.is_recurring)
        .bind(data.recurrence)
        .bind(data.next_recurrence)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by id inside the scope
    pub async fn find_by_id(
        pool: &PgPool,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE org_id = $1 AND id = $2"
        ))
        .bind(scope.org_id())
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists tasks matching a filter, newest first
    pub async fn list(
        pool: &PgPool,
        scope: &TenantScope,
        filter: &TaskFilter,
        pagination: Pagination,
    ) -> Result<Page<Self>, sqlx::Error> {
        let pattern = filter.like_pattern();

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM tasks WHERE {FILTER}"))
            .bind(scope.org_id())
            .bind(filter.status)
            .bind(filter.priority)
            .bind(filter.assignee_id)
            .bind(pattern.as_deref())
            .fetch_one(pool)
            .await?;

        let items = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE {FILTER} \
             ORDER BY created_at DESC, seq DESC LIMIT $6 OFFSET $7"
        ))
        .bind(scope.org_id())
        .bind(filter.status)
        .bind(filter.priority)
        .bind(filter.assignee_id)
        .bind(pattern.as_deref())
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

        Ok(Page { items, total })
    }

    /// Every task in the scope, for aggregate reports
    pub async fn list_all(pool: &PgPool, scope: &TenantScope) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE org_id = $1 ORDER BY created_at DESC"
        ))
        .bind(scope.org_id())
        .fetch_all(pool)
        .await
    }

    /// Writes back every mutable field of `task`
    ///
    /// Last write wins; there is no version check. Returns `None` when the
    /// task no longer exists in the scope.
    pub async fn save(
        pool: &PgPool,
        scope: &TenantScope,
        task: &Task,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, status = $5, priority = $6, assignee_id = $7,
                tags = $8, due_date = $9, completed_at = $10, is_recurring = $11,
                recurrence = $12, next_recurrence = $13, updated_at = NOW()
            WHERE org_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(scope.org_id())
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.assignee_id)
        .bind(&task.tags)
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.is_recurring)
        .bind(task.recurrence)
        .bind(task.next_recurrence)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a task; returns whether a row was removed
    pub async fn delete(pool: &PgPool, scope: &TenantScope, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE org_id = $1 AND id = $2")
            .bind(scope.org_id())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Recurring tasks due on or before `today`, across all organizations
    ///
    /// Only the recurrence scheduler calls this. Each returned row carries its
    /// own `org_id`, from which the scheduler builds a system scope.
    pub async fn find_due_recurring(
        pool: &PgPool,
        today: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {COLUMNS} FROM tasks
            WHERE is_recurring = TRUE AND next_recurrence IS NOT NULL AND next_recurrence <= $1
            ORDER BY next_recurrence ASC, seq ASC
            "#
        ))
        .bind(today)
        .fetch_all(pool)
        .await
    }

    /// Moves a recurring task's next occurrence date
    pub async fn set_next_recurrence(
        pool: &PgPool,
        scope: &TenantScope,
        id: Uuid,
        next: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET next_recurrence = $3, updated_at = NOW() WHERE org_id = $1 AND id = $2",
        )
        .bind(scope.org_id())
        .bind(id)
        .bind(next)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
