//! # TaskHub Worker
//!
//! Runs the recurrence scheduler: a tick at startup, then one every
//! `SCHEDULER_INTERVAL_SECS`, until ctrl-c.
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskhub cargo run -p taskhub-worker
//! ```

use std::sync::Arc;
use taskhub_shared::{
    db::pool::{close_pool, create_pool, DatabaseConfig},
    store::PgStore,
};
use taskhub_worker::{config::WorkerConfig, scheduler::RecurrenceScheduler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("TaskHub Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;
    let pool = create_pool(DatabaseConfig::new(
        config.database_url.clone(),
        config.max_connections,
    ))
    .await?;

    let scheduler = RecurrenceScheduler::new(Arc::new(PgStore::new(pool.clone())), config.scheduler);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    scheduler.run(shutdown).await;
    close_pool(pool).await;

    tracing::info!("Worker stopped");
    Ok(())
}
