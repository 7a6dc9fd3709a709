/// Role-based access control
///
/// Every authenticated request is checked against a static permission table
/// before any data is touched. The table maps a role to the actions it may
/// perform on each resource:
///
/// | role    | tasks, task_template                | users                                 | auditLogs | dashboard | notifications | reports | organization |
/// |---------|-------------------------------------|---------------------------------------|-----------|-----------|---------------|---------|--------------|
/// | admin   | create, read, update, delete, assign | create, read, update, delete, changeRole | read   | read      | read, update  | read    | read, update |
/// | manager | create, read, update, assign        | read                                  | read      | read      | read, update  | read    |              |
/// | member  | create, read, update                | read                                  |           | read      | read, update  | read    |              |
///
/// The table is compiled in and immutable. Unknown roles, resources or
/// actions are denied.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::authorization::{authorize, is_allowed, Action, Resource};
/// use taskhub_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let auth = AuthContext::new(Uuid::new_v4(), Uuid::new_v4(), "member", "m@example.com");
/// assert!(authorize(&auth, Action::Create, Resource::Tasks).is_ok());
/// assert!(authorize(&auth, Action::Delete, Resource::Tasks).is_err());
/// assert!(!is_allowed("owner", "read", "tasks"));
/// ```

use std::fmt;

use super::middleware::AuthContext;
use crate::models::user::Role;

/// Error type for access checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The caller's role lacks the permission
    #[error("Role '{role}' does not have '{action}' permission on '{resource}'")]
    Denied {
        role: String,
        action: String,
        resource: String,
    },

    /// The request names an organization other than the caller's
    #[error("Forbidden")]
    CrossTenant,
}

/// Protected resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Tasks,
    Users,
    AuditLogs,
    Dashboard,
    Notifications,
    Reports,
    TaskTemplate,
    Organization,
}

impl Resource {
    pub const ALL: [Resource; 8] = [
        Resource::Tasks,
        Resource::Users,
        Resource::AuditLogs,
        Resource::Dashboard,
        Resource::Notifications,
        Resource::Reports,
        Resource::TaskTemplate,
        Resource::Organization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Tasks => "tasks",
            Resource::Users => "users",
            Resource::AuditLogs => "auditLogs",
            Resource::Dashboard => "dashboard",
            Resource::Notifications => "notifications",
            Resource::Reports => "reports",
            Resource::TaskTemplate => "task_template",
            Resource::Organization => "organization",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations a role may be granted on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Assign,
    ChangeRole,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Assign,
        Action::ChangeRole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Assign => "assign",
            Action::ChangeRole => "changeRole",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use Action::*;

const TASKS_FULL: &[Action] = &[Create, Read, Update, Delete, Assign];
const TASKS_MANAGE: &[Action] = &[Create, Read, Update, Assign];
const TASKS_CONTRIBUTE: &[Action] = &[Create, Read, Update];
const USERS_FULL: &[Action] = &[Create, Read, Update, Delete, ChangeRole];
const READ_ONLY: &[Action] = &[Read];
const READ_UPDATE: &[Action] = &[Read, Update];
const NONE: &[Action] = &[];

/// Actions granted to `role` on `resource`
pub fn permissions(role: Role, resource: Resource) -> &'static [Action] {
    match (role, resource) {
        (Role::Admin, Resource::Tasks | Resource::TaskTemplate) => TASKS_FULL,
        (Role::Admin, Resource::Users) => USERS_FULL,
        (Role::Admin, Resource::Organization) => READ_UPDATE,

        (Role::Manager, Resource::Tasks | Resource::TaskTemplate) => TASKS_MANAGE,
        (Role::Manager, Resource::Users) => READ_ONLY,
        (Role::Manager, Resource::Organization) => NONE,

        (Role::Member, Resource::Tasks | Resource::TaskTemplate) => TASKS_CONTRIBUTE,
        (Role::Member, Resource::Users) => READ_ONLY,
        (Role::Member, Resource::AuditLogs | Resource::Organization) => NONE,

        (_, Resource::AuditLogs | Resource::Dashboard | Resource::Reports) => READ_ONLY,
        (_, Resource::Notifications) => READ_UPDATE,
    }
}

/// Typed permission check
pub fn can(role: Role, action: Action, resource: Resource) -> bool {
    permissions(role, resource).contains(&action)
}

/// String-level permission check; anything unrecognized is denied
pub fn is_allowed(role: &str, action: &str, resource: &str) -> bool {
    match (
        role.parse::<Role>().ok(),
        Action::parse(action),
        Resource::parse(resource),
    ) {
        (Some(role), Some(action), Some(resource)) => can(role, action, resource),
        _ => false,
    }
}

/// Checks the caller's role against the permission table
///
/// # Errors
///
/// Returns [`AccessError::Denied`] naming the role, action and resource.
pub fn authorize(auth: &AuthContext, action: Action, resource: Resource) -> Result<(), AccessError> {
    if is_allowed(&auth.role, action.as_str(), resource.as_str()) {
        return Ok(());
    }

    tracing::debug!(
        user_id = %auth.user_id,
        role = %auth.role,
        action = action.as_str(),
        resource = resource.as_str(),
        "Access denied"
    );

    Err(AccessError::Denied {
        role: auth.role.clone(),
        action: action.as_str().to_string(),
        resource: resource.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn expected(role: &str, resource: &str) -> &'static [&'static str] {
        match (role, resource) {
            ("admin", "tasks" | "task_template") => &["create", "read", "update", "delete", "assign"],
            ("admin", "users") => &["create", "read", "update", "delete", "changeRole"],
            ("admin", "organization") => &["read", "update"],
            ("manager", "tasks" | "task_template") => &["create", "read", "update", "assign"],
            ("member", "tasks" | "task_template") => &["create", "read", "update"],
            ("manager" | "member", "users") => &["read"],
            ("admin" | "manager", "auditLogs") => &["read"],
            (_, "dashboard" | "reports") => &["read"],
            (_, "notifications") => &["read", "update"],
            _ => &[],
        }
    }

    #[test]
    fn test_table_matches_every_cell() {
        for role in ["admin", "manager", "member"] {
            for resource in Resource::ALL {
                let granted = expected(role, resource.as_str());
                for action in Action::ALL {
                    assert_eq!(
                        is_allowed(role, action.as_str(), resource.as_str()),
                        granted.contains(&action.as_str()),
                        "{} {} {}",
                        role,
                        action,
                        resource
                    );
                }
            }
        }
    }

    #[test]
    fn test_unknown_inputs_are_denied() {
        assert!(!is_allowed("owner", "read", "tasks"));
        assert!(!is_allowed("admin", "archive", "tasks"));
        assert!(!is_allowed("admin", "read", "invoices"));
        assert!(!is_allowed("", "", ""));
        assert!(!is_allowed("Admin", "read", "tasks"));
    }

    #[test]
    fn test_authorize_error_message() {
        let auth = AuthContext::new(Uuid::new_v4(), Uuid::new_v4(), "member", "m@example.com");
        let err = authorize(&auth, Action::Delete, Resource::Tasks).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Role 'member' does not have 'delete' permission on 'tasks'"
        );
        assert!(authorize(&auth, Action::Update, Resource::Notifications).is_ok());
    }

    #[test]
    fn test_cross_tenant_message() {
        assert_eq!(AccessError::CrossTenant.to_string(), "Forbidden");
    }
}
