/// API route handlers
///
/// Every handler under `/orgs/:org_id` follows the same sequence: resolve
/// the tenant scope from the path (403 on mismatch), check the role's
/// permission, then call the service layer.

pub mod audit_logs;
pub mod auth;
pub mod health;
pub mod notifications;
pub mod orgs;
pub mod reports;
pub mod tasks;
pub mod templates;
pub mod users;

use serde::Deserialize;
use uuid::Uuid;

/// `/orgs/:org_id`
#[derive(Debug, Deserialize)]
pub struct OrgPath {
    pub org_id: Uuid,
}

/// `/orgs/:org_id/<collection>/:id`
#[derive(Debug, Deserialize)]
pub struct OrgItemPath {
    pub org_id: Uuid,
    pub id: Uuid,
}

/// Body of delete responses
#[derive(Debug, serde::Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Distinguishes an absent field from an explicit `null`
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent gives `None`, `null` gives `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
