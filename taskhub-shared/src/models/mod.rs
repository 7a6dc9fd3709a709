/// Database models for TaskHub
///
/// This module contains the persisted entities and their tenant-scoped SQL
/// operations. Every operation on tenant data takes a [`TenantScope`] and
/// filters by its organization id; see [`crate::tenancy`].
///
/// # Models
///
/// - `organization`: Tenants, their plan and settings
/// - `user`: Organization members with a role and notification preferences
/// - `task`: Tasks, including recurrence bookkeeping
/// - `comment`: Immutable task comments
/// - `template`: Reusable task templates (unique name per organization)
/// - `notification`: In-app notices for a single recipient
/// - `audit_log`: Append-only audit trail
///
/// [`TenantScope`]: crate::tenancy::TenantScope

pub mod audit_log;
pub mod comment;
pub mod notification;
pub mod organization;
pub mod task;
pub mod template;
pub mod user;

use serde::Serialize;

/// Upper bound on page size for every list endpoint
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page selection for list queries
///
/// Pages are 1-based. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Builds a pagination from optional query values
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// One page of results plus the unpaged total
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
