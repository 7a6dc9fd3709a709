/// Worker configuration from environment variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `SCHEDULER_INTERVAL_SECS`: Seconds between recurrence ticks (default: 3600)
/// - `RUST_LOG`: Log filter (default: `taskhub_worker=debug`)

use crate::scheduler::SchedulerConfig;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub scheduler: SchedulerConfig,
}

fn parse_u64(name: &str, raw: Option<String>, default: u64) -> anyhow::Result<u64> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e)),
        None => Ok(default),
    }
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = parse_u64(
            "DATABASE_MAX_CONNECTIONS",
            env::var("DATABASE_MAX_CONNECTIONS").ok(),
            10,
        )?;

        let interval_secs = parse_u64(
            "SCHEDULER_INTERVAL_SECS",
            env::var("SCHEDULER_INTERVAL_SECS").ok(),
            3600,
        )?;
        if interval_secs == 0 {
            anyhow::bail!("SCHEDULER_INTERVAL_SECS must be greater than zero");
        }

        Ok(Self {
            database_url,
            max_connections: u32::try_from(max_connections)?,
            scheduler: SchedulerConfig {
                interval: Duration::from_secs(interval_secs),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_default_and_value() {
        assert_eq!(parse_u64("X", None, 3600).unwrap(), 3600);
        assert_eq!(parse_u64("X", Some(" 60 ".to_string()), 3600).unwrap(), 60);
    }

    #[test]
    fn test_parse_u64_rejects_garbage() {
        let err = parse_u64("SCHEDULER_INTERVAL_SECS", Some("hourly".to_string()), 3600).unwrap_err();
        assert!(err.to_string().contains("SCHEDULER_INTERVAL_SECS"));
    }
}
