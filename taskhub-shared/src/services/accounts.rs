/// Accounts, organizations and per-user settings
///
/// Registration either creates an organization or joins the one whose slug
/// matches the requested name. The first user of an organization becomes
/// its admin; everyone after that starts as a member.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::ValidateEmail;

use super::{Caller, ServiceError};
use crate::audit::{AuditEvent, AuditRecorder};
use crate::auth::jwt::{create_token, Claims};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::models::audit_log::AuditActor;
use crate::models::notification::Notification;
use crate::models::organization::{slugify, CreateOrganization, Organization, UpdateOrganization};
use crate::models::user::{CreateUser, NotificationPrefs, Role, User};
use crate::store::{Store, StoreError};
use crate::tenancy::TenantScope;

pub const USER_RESOURCE: &str = "user";
pub const ORGANIZATION_RESOURCE: &str = "organization";
pub const NOTIFICATION_RESOURCE: &str = "notification";
pub const PREFERENCES_RESOURCE: &str = "notificationPreferences";

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub org_name: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub org_slug: String,
}

/// User fields returned alongside a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub org_id: Uuid,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            org_id: user.org_id,
        }
    }
}

/// A signed-in user
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

/// Partial preference update; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefsUpdate {
    pub email: Option<bool>,
    pub in_app: Option<bool>,
}

fn normalize_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(ServiceError::Validation("Invalid email address".to_string()));
    }
    Ok(email)
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    audit: AuditRecorder,
    jwt_secret: Arc<str>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            audit: AuditRecorder::new(store.clone()),
            store,
            jwt_secret: jwt_secret.into(),
        }
    }

    fn session(&self, user: &User) -> Result<Session, ServiceError> {
        let claims = Claims::new(user.id, user.org_id, user.role.as_str(), &user.email);
        Ok(Session {
            token: create_token(&claims, &self.jwt_secret)?,
            user: SessionUser::from(user),
        })
    }

    /// Finds the organization for `org_name`'s slug, creating it if needed
    async fn find_or_create_organization(&self, org_name: &str) -> Result<Organization, ServiceError> {
        let slug = slugify(org_name);
        if let Some(org) = self.store.find_organization_by_slug(&slug).await? {
            return Ok(org);
        }

        let created = self
            .store
            .create_organization(CreateOrganization {
                name: org_name.trim().to_string(),
                slug: slug.clone(),
            })
            .await;

        match created {
            Ok(org) => {
                tracing::info!(org_id = %org.id, slug = %org.slug, "Organization created");
                Ok(org)
            }
            // Lost a race with a concurrent registration for the same name
            Err(StoreError::Conflict(_)) => self
                .store
                .find_organization_by_slug(&slug)
                .await?
                .ok_or(ServiceError::NotFound("Organization")),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a user and returns a session for it
    pub async fn register(&self, input: Registration, ip: Option<String>) -> Result<Session, ServiceError> {
        let name = input.name.trim();
        if name.is_empty() || input.org_name.trim().is_empty() {
            return Err(ServiceError::Validation("All fields are required".to_string()));
        }
        let email = normalize_email(&input.email)?;
        validate_password_strength(&input.password).map_err(ServiceError::Validation)?;

        let org = self.find_or_create_organization(&input.org_name).await?;
        let scope = TenantScope::from_organization(&org);

        if self.store.find_user_by_email(&scope, &email).await?.is_some() {
            return Err(ServiceError::Conflict(
                "User already exists in this organization".to_string(),
            ));
        }

        let role = if self.store.count_users(&scope).await? == 0 {
            Role::Admin
        } else {
            Role::Member
        };

        let user = self
            .store
            .create_user(
                &scope,
                CreateUser {
                    name: name.to_string(),
                    email,
                    password_hash: hash_password(&input.password)?,
                    role,
                },
            )
            .await?;

        tracing::info!(org_id = %org.id, user_id = %user.id, role = %user.role, "User registered");

        self.audit
            .record(
                &scope,
                AuditEvent::new(AuditActor::User(user.id), "create", USER_RESOURCE)
                    .resource_id(user.id)
                    .changes(json!({ "name": user.name, "email": user.email, "role": user.role }))
                    .ip(ip),
            )
            .await;

        self.session(&user)
    }

    /// Checks credentials and returns a session
    ///
    /// An unknown email and a wrong password are indistinguishable.
    pub async fn login(&self, input: Credentials) -> Result<Session, ServiceError> {
        if input.email.trim().is_empty() || input.password.is_empty() || input.org_slug.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Email, password, and organization are required".to_string(),
            ));
        }

        let org = self
            .store
            .find_organization_by_slug(input.org_slug.trim())
            .await?
            .ok_or(ServiceError::NotFound("Organization"))?;
        let scope = TenantScope::from_organization(&org);

        let email = input.email.trim().to_lowercase();
        let invalid = || ServiceError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .store
            .find_user_by_email(&scope, &email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::debug!(org_id = %org.id, user_id = %user.id, "Rejected login");
            return Err(invalid());
        }

        self.store.update_last_login(&scope, user.id).await?;

        self.session(&user)
    }

    /// Assigns `role` (admin, manager or member) to a user
    pub async fn change_role(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        user_id: Uuid,
        role: &str,
    ) -> Result<User, ServiceError> {
        let role: Role = role
            .parse()
            .map_err(|_| ServiceError::Validation("Invalid role".to_string()))?;

        let before = self
            .store
            .find_user(scope, user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        let user = self
            .store
            .update_user_role(scope, user_id, role)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        tracing::info!(
            org_id = %scope.org_id(),
            user_id = %user.id,
            from = %before.role,
            to = %user.role,
            "Role changed"
        );

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "update", USER_RESOURCE)
                    .resource_id(user.id)
                    .changes(json!({
                        "before": { "role": before.role },
                        "after": { "role": user.role },
                    }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(user)
    }

    pub async fn update_organization(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        data: UpdateOrganization,
    ) -> Result<Organization, ServiceError> {
        if data.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ServiceError::Validation("Name must not be empty".to_string()));
        }
        if data.max_users.is_some_and(|n| n < 1) || data.max_tasks.is_some_and(|n| n < 1) {
            return Err(ServiceError::Validation("Limits must be positive".to_string()));
        }

        let before = self
            .store
            .find_organization(scope)
            .await?
            .ok_or(ServiceError::NotFound("Organization"))?;

        let org = self
            .store
            .update_organization(scope, data)
            .await?
            .ok_or(ServiceError::NotFound("Organization"))?;

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "update", ORGANIZATION_RESOURCE)
                    .resource_id(org.id)
                    .changes(json!({
                        "before": { "name": before.name, "plan": before.plan, "settings": before.settings },
                        "after": { "name": org.name, "plan": org.plan, "settings": org.settings },
                    }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(org)
    }

    pub async fn notification_prefs(
        &self,
        scope: &TenantScope,
        user_id: Uuid,
    ) -> Result<NotificationPrefs, ServiceError> {
        self.store
            .find_user(scope, user_id)
            .await?
            .map(|user| user.notification_prefs)
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Updates the caller's own delivery preferences
    pub async fn update_notification_prefs(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        update: PrefsUpdate,
    ) -> Result<NotificationPrefs, ServiceError> {
        let before = self.notification_prefs(scope, caller.user_id).await?;
        let after = NotificationPrefs {
            email: update.email.unwrap_or(before.email),
            in_app: update.in_app.unwrap_or(before.in_app),
        };

        let user = self
            .store
            .update_notification_prefs(scope, caller.user_id, after)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "update", PREFERENCES_RESOURCE)
                    .resource_id(caller.user_id)
                    .changes(json!({ "before": before, "after": user.notification_prefs }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(user.notification_prefs)
    }

    /// Marks one of the caller's notifications as read
    pub async fn mark_read(
        &self,
        scope: &TenantScope,
        caller: &Caller,
        notification_id: Uuid,
    ) -> Result<Notification, ServiceError> {
        let notification = self
            .store
            .mark_notification_read(scope, caller.user_id, notification_id)
            .await?
            .ok_or(ServiceError::NotFound("Notification"))?;

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "update", NOTIFICATION_RESOURCE)
                    .resource_id(notification.id)
                    .changes(json!({ "read": true }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(notification)
    }

    /// Marks all of the caller's unread notifications as read
    pub async fn mark_all_read(&self, scope: &TenantScope, caller: &Caller) -> Result<u64, ServiceError> {
        let count = self.store.mark_all_notifications_read(scope, caller.user_id).await?;

        self.audit
            .record(
                scope,
                AuditEvent::new(caller.actor(), "update", NOTIFICATION_RESOURCE)
                    .changes(json!({ "markedAllRead": true, "count": count }))
                    .ip(caller.ip.clone()),
            )
            .await;

        Ok(count)
    }
}
