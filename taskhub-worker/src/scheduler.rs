/// Recurrence scheduler
///
/// Periodically spawns plain task instances from recurring tasks that have
/// fallen due and moves each source task's `next_recurrence` one cadence
/// step forward.
///
/// # Architecture
///
/// ```text
/// RecurrenceScheduler::run
///   └─> every interval: tick(today)
///         ├─> Store::find_due_recurring_tasks   (all organizations)
///         └─> per due task, isolated:
///               ├─> Store::create_task           (instance, same org)
///               ├─> Store::set_next_recurrence   (previous date + 1 step)
///               └─> AuditRecorder::record        (created_recurring, system actor)
/// ```
///
/// A failure on one task is logged and counted; the tick carries on with the
/// next one. A failed tick is logged and retried on the next interval.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_shared::store::MemoryStore;
/// use taskhub_worker::scheduler::{RecurrenceScheduler, SchedulerConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let scheduler = RecurrenceScheduler::new(Arc::new(MemoryStore::new()), SchedulerConfig::default());
/// let shutdown = CancellationToken::new();
/// scheduler.run(shutdown).await;
/// # }
/// ```

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use taskhub_shared::{
    audit::{AuditEvent, AuditRecorder, SYSTEM_IP},
    models::{
        audit_log::AuditActor,
        task::{NewTask, Task},
    },
    recurrence::{advance, today},
    store::{Store, StoreError},
    tenancy::TenantScope,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Audit action for instances spawned by the scheduler
pub const CREATED_RECURRING: &str = "created_recurring";

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between ticks
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            interval: Duration::from_secs(3600),
        }
    }
}

/// Counts from one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Recurring tasks found due
    pub due: usize,

    /// Instances created and sources advanced
    pub spawned: usize,

    /// Due tasks skipped because a write failed
    pub failed: usize,
}

pub struct RecurrenceScheduler {
    store: Arc<dyn Store>,
    audit: AuditRecorder,
    config: SchedulerConfig,
}

impl RecurrenceScheduler {
    pub fn new(store: Arc<dyn Store>, config: SchedulerConfig) -> Self {
        RecurrenceScheduler {
            audit: AuditRecorder::new(store.clone()),
            store,
            config,
        }
    }

    /// Runs one pass over every recurring task due on or before `today`
    ///
    /// # Errors
    ///
    /// Only the initial lookup can fail the tick; per-task failures are
    /// reported in [`TickReport::failed`].
    pub async fn tick(&self, today: NaiveDate) -> Result<TickReport, StoreError> {
        let due = self.store.find_due_recurring_tasks(today).await?;

        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };

        for source in &due {
            match self.spawn_instance(source).await {
                Ok(instance) => {
                    report.spawned += 1;
                    tracing::debug!(
                        org_id = %source.org_id,
                        task_id = %source.id,
                        instance_id = %instance.id,
                        "Spawned recurring task instance"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        org_id = %source.org_id,
                        task_id = %source.id,
                        error = %e,
                        "Failed to spawn recurring task instance"
                    );
                }
            }
        }

        if report.due > 0 {
            tracing::info!(
                due = report.due,
                spawned = report.spawned,
                failed = report.failed,
                "Recurrence tick finished"
            );
        }

        Ok(report)
    }

    async fn spawn_instance(&self, source: &Task) -> Result<Task, StoreError> {
        // Rows come from the store, so their org id is trusted
        let scope = TenantScope::system(source.org_id);

        // Filtered on by the due query; a missing cadence means the row changed since
        let (Some(cadence), Some(previous)) = (source.recurrence, source.next_recurrence) else {
            return Err(StoreError::Unavailable(format!(
                "task {} has no recurrence schedule",
                source.id
            )));
        };

        let instance = self
            .store
            .create_task(&scope, NewTask::instance_of(source))
            .await?;

        self.store
            .set_next_recurrence(&scope, source.id, advance(previous, cadence))
            .await?;

        self.audit
            .record(
                &scope,
                AuditEvent::new(AuditActor::System, CREATED_RECURRING, "task")
                    .resource_id(instance.id)
                    .changes(json!({ "title": instance.title, "fromTask": source.id }))
                    .ip(Some(SYSTEM_IP.to_string())),
            )
            .await;

        Ok(instance)
    }

    /// Ticks immediately and then once per interval until `shutdown` fires
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "Recurrence scheduler starting"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Recurrence scheduler stopping");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick(today()).await {
                        tracing::error!(error = %e, "Recurrence tick failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval_is_hourly() {
        assert_eq!(SchedulerConfig::default().interval, Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(taskhub_shared::store::MemoryStore::new());
        let scheduler = RecurrenceScheduler::new(store, SchedulerConfig::default());
        let shutdown = CancellationToken::new();

        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { scheduler.run(shutdown).await })
        };

        tokio::time::sleep(Duration::from_secs(7200)).await;
        shutdown.cancel();
        handle.await.unwrap();
    }
}
