/// HTTP middleware
///
/// - `auth`: Bearer token authentication for organization routes
/// - `security`: Security response headers

pub mod auth;
pub mod security;
