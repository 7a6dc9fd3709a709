/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_api::{app::AppState, config::Config};
/// use taskhub_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = taskhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use taskhub_shared::services::{
    accounts::AccountService, tasks::TaskService, templates::TemplateService,
};
use taskhub_shared::store::Store;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
/// Every field is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub tasks: TaskService,
    pub templates: TemplateService,
    pub accounts: AccountService,
}

impl AppState {
    /// Creates new application state over `store`
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            tasks: TaskService::new(store.clone()),
            templates: TemplateService::new(store.clone()),
            accounts: AccountService::new(store.clone(), config.jwt.secret.as_str()),
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api/v1
/// ├── GET  /health                         (public)
/// ├── POST /auth/register                  (public)
/// ├── POST /auth/login                     (public)
/// └── /orgs/:org_id                        (Bearer token, path org = token org)
///     ├── GET|PUT  /
///     ├── /tasks, /tasks/:id, /tasks/:id/activity, /tasks/:id/comments
///     ├── /task-templates, /task-templates/:id, /task-templates/:id/create-task
///     ├── /notifications/...
///     ├── /audit-logs
///     ├── /users, /users/:id/role
///     ├── /dashboard/stats
///     └── /reports/{task-distribution,tasks-over-time,team-workload}
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (organization routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login));

    let org_routes = Router::new()
        .route(
            "/orgs/:org_id",
            get(routes::orgs::get_organization).put(routes::orgs::update_organization),
        )
        // Tasks
        .route(
            "/orgs/:org_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/orgs/:org_id/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/orgs/:org_id/tasks/:id/activity", get(routes::tasks::task_activity))
        .route(
            "/orgs/:org_id/tasks/:id/comments",
            get(routes::tasks::list_comments).post(routes::tasks::add_comment),
        )
        // Templates
        .route(
            "/orgs/:org_id/task-templates",
            get(routes::templates::list_templates).post(routes::templates::create_template),
        )
        .route(
            "/orgs/:org_id/task-templates/:id",
            get(routes::templates::get_template)
                .put(routes::templates::update_template)
                .delete(routes::templates::delete_template),
        )
        .route(
            "/orgs/:org_id/task-templates/:id/create-task",
            post(routes::templates::create_task_from_template),
        )
        // Notifications
        .route(
            "/orgs/:org_id/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/orgs/:org_id/notifications/unread-count",
            get(routes::notifications::unread_count),
        )
        .route(
            "/orgs/:org_id/notifications/mark-all-read",
            put(routes::notifications::mark_all_read),
        )
        .route(
            "/orgs/:org_id/notifications/preferences",
            get(routes::notifications::get_preferences).put(routes::notifications::update_preferences),
        )
        .route(
            "/orgs/:org_id/notifications/:id/read",
            put(routes::notifications::mark_read),
        )
        // Administration and reporting
        .route("/orgs/:org_id/audit-logs", get(routes::audit_logs::list_audit_logs))
        .route("/orgs/:org_id/users", get(routes::users::list_users))
        .route("/orgs/:org_id/users/:id/role", put(routes::users::change_role))
        .route("/orgs/:org_id/dashboard/stats", get(routes::reports::dashboard_stats))
        .route(
            "/orgs/:org_id/reports/task-distribution",
            get(routes::reports::task_distribution),
        )
        .route(
            "/orgs/:org_id/reports/tasks-over-time",
            get(routes::reports::tasks_over_time),
        )
        .route("/orgs/:org_id/reports/team-workload", get(routes::reports::team_workload))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(org_routes);

    let cors = if state.config.cors_allows_any() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.enable_hsts))
        .with_state(state)
}
