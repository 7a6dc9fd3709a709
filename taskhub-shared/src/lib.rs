//! # TaskHub Shared Library
//!
//! Domain logic shared by the TaskHub API server and the recurrence worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `store`: Tenant-scoped persistence (`Store` trait, Postgres and in-memory)
//! - `tenancy`: Organization scope attached to every data access
//! - `auth`: Tokens, passwords and the role permission table
//! - `services`: Task, template and account operations with their side effects
//! - `audit`: Best-effort audit trail recording
//! - `notify`: Best-effort in-app notifications
//! - `activity`: Task timeline rebuilt from audit entries and comments
//! - `recurrence`: Cadence date arithmetic
//! - `reports`: Dashboard and report aggregations
//! - `db`: Connection pool and migrations

pub mod activity;
pub mod audit;
pub mod auth;
pub mod db;
pub mod models;
pub mod notify;
pub mod recurrence;
pub mod reports;
pub mod services;
pub mod store;
pub mod tenancy;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
