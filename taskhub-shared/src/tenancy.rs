/// Tenant scope enforcement
///
/// Every read and write of tenant data goes through a [`TenantScope`]. The
/// scope carries the organization id that all queries filter by, and it can
/// only be obtained from server-trusted sources:
///
/// - an authenticated [`AuthContext`] (optionally checked against the
///   organization id in the request path),
/// - an [`Organization`] row fetched by the server (registration and login),
/// - [`TenantScope::system`] for background jobs that already hold a row
///   loaded from the database.
///
/// Request bodies never carry an organization id, so a client cannot widen
/// its own scope.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::middleware::AuthContext;
/// use taskhub_shared::tenancy::TenantScope;
/// use uuid::Uuid;
///
/// let auth = AuthContext::new(Uuid::new_v4(), Uuid::new_v4(), "member", "a@example.com");
///
/// // Same organization: allowed
/// let scope = TenantScope::for_path(&auth, auth.org_id).unwrap();
/// assert_eq!(scope.org_id(), auth.org_id);
///
/// // Another organization's URL: rejected
/// assert!(TenantScope::for_path(&auth, Uuid::new_v4()).is_err());
/// ```

use uuid::Uuid;

use crate::auth::authorization::AccessError;
use crate::auth::middleware::AuthContext;
use crate::models::organization::Organization;

/// Organization boundary for data access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    org_id: Uuid,
}

impl TenantScope {
    /// Scope of the caller's own organization
    pub fn from_auth(auth: &AuthContext) -> Self {
        Self {
            org_id: auth.org_id,
        }
    }

    /// Scope for a request addressed to `/orgs/{path_org_id}/...`
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::CrossTenant`] when the path names an organization
    /// other than the caller's. Handlers call this before touching the store.
    pub fn for_path(auth: &AuthContext, path_org_id: Uuid) -> Result<Self, AccessError> {
        if auth.org_id != path_org_id {
            tracing::warn!(
                user_id = %auth.user_id,
                org_id = %auth.org_id,
                requested_org_id = %path_org_id,
                "Cross-tenant request rejected"
            );
            return Err(AccessError::CrossTenant);
        }

        Ok(Self::from_auth(auth))
    }

    /// Scope of an organization row loaded by the server
    pub fn from_organization(org: &Organization) -> Self {
        Self { org_id: org.id }
    }

    /// Scope for background jobs acting on rows they loaded themselves
    ///
    /// The organization id must come from the database, never from input.
    pub fn system(org_id: Uuid) -> Self {
        Self { org_id }
    }

    /// Organization id every query in this scope filters by
    pub fn org_id(&self) -> Uuid {
        self.org_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(org_id: Uuid) -> AuthContext {
        AuthContext::new(Uuid::new_v4(), org_id, "admin", "admin@example.com")
    }

    #[test]
    fn test_for_path_same_org() {
        let org_id = Uuid::new_v4();
        let scope = TenantScope::for_path(&auth(org_id), org_id).unwrap();
        assert_eq!(scope.org_id(), org_id);
    }

    #[test]
    fn test_for_path_other_org_is_rejected() {
        let result = TenantScope::for_path(&auth(Uuid::new_v4()), Uuid::new_v4());
        assert!(matches!(result, Err(AccessError::CrossTenant)));
    }

    #[test]
    fn test_scope_constructors_agree() {
        let org_id = Uuid::new_v4();
        assert_eq!(TenantScope::from_auth(&auth(org_id)).org_id(), org_id);
        assert_eq!(TenantScope::system(org_id), TenantScope::from_auth(&auth(org_id)));
    }
}
