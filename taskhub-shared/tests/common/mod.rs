//! Common test utilities for shared-crate integration tests
//!
//! Builds an in-memory store holding one organization with an admin, a
//! manager and a member, plus the services wired to it.

#![allow(dead_code)]

use std::sync::Arc;
use taskhub_shared::models::organization::CreateOrganization;
use taskhub_shared::models::user::{CreateUser, Role, User};
use taskhub_shared::services::tasks::TaskService;
use taskhub_shared::services::templates::TemplateService;
use taskhub_shared::services::Caller;
use taskhub_shared::store::{MemoryStore, Store};
use taskhub_shared::tenancy::TenantScope;
use uuid::Uuid;

pub struct TestOrg {
    pub store: Arc<MemoryStore>,
    pub scope: TenantScope,
    pub admin: User,
    pub manager: User,
    pub member: User,
    pub tasks: TaskService,
    pub templates: TemplateService,
}

impl TestOrg {
    pub async fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new())).await
    }

    /// Adds another organization to an existing store
    pub async fn with_store(store: Arc<MemoryStore>) -> Self {
        let slug = format!("org-{}", Uuid::new_v4());
        let org = store
            .create_organization(CreateOrganization {
                name: slug.clone(),
                slug,
            })
            .await
            .expect("Failed to create organization");
        let scope = TenantScope::from_organization(&org);

        let admin = create_user(&store, &scope, "admin", Role::Admin).await;
        let manager = create_user(&store, &scope, "manager", Role::Manager).await;
        let member = create_user(&store, &scope, "member", Role::Member).await;

        Self {
            tasks: TaskService::new(store.clone()),
            templates: TemplateService::new(store.clone()),
            store,
            scope,
            admin,
            manager,
            member,
        }
    }

    pub fn caller(&self, user: &User) -> Caller {
        Caller {
            user_id: user.id,
            ip: Some("127.0.0.1".to_string()),
        }
    }
}

pub async fn create_user(store: &MemoryStore, scope: &TenantScope, name: &str, role: Role) -> User {
    store
        .create_user(
            scope,
            CreateUser {
                name: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "not-a-real-hash".to_string(),
                role,
            },
        )
        .await
        .expect("Failed to create user")
}
