//! Common test utilities for API integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An in-memory store with one organization (admin, manager, member)
//! - JWT token generation for those users
//! - Request helpers that return the status and parsed JSON envelope

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskhub_shared::auth::jwt::{create_token, Claims};
use taskhub_shared::models::organization::{CreateOrganization, Organization};
use taskhub_shared::models::user::{CreateUser, Role, User};
use taskhub_shared::store::{MemoryStore, Store};
use taskhub_shared::tenancy::TenantScope;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            enable_hsts: false,
            run_migrations: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
    }
}

/// Test context containing all necessary resources
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub org: Organization,
    pub scope: TenantScope,
    pub admin: User,
    pub manager: User,
    pub member: User,
}

impl TestApp {
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

        let app = build_router(AppState::new(store.clone(), test_config()));

        Self {
            store,
            app,
            org,
            scope,
            admin,
            manager,
            member,
        }
    }

    /// Bearer token for `user`
    pub fn token(&self, user: &User) -> String {
        token_for(user)
    }

    /// `/api/v1/orgs/:org_id` + `path`
    pub fn org_uri(&self, path: &str) -> String {
        format!("/api/v1/orgs/{}{}", self.org.id, path)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        send(&self.app, Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        send(&self.app, Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        send(&self.app, Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        send(&self.app, Method::DELETE, uri, token, None).await
    }
}

pub fn token_for(user: &User) -> String {
    let claims = Claims::new(user.id, user.org_id, user.role.as_str(), &user.email);
    create_token(&claims, JWT_SECRET).expect("Failed to create token")
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

/// Sends one request through the router
///
/// Bodies that are not JSON come back as `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("Router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
