/// Health check endpoint
///
/// Verifies the server is running and the store is reachable.
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "healthy", "version": "0.1.0", "database": "connected" },
///   "error": null
/// }
/// ```

use crate::{
    app::AppState,
    response::{ok, Envelope},
};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,
}

/// Health check handler
///
/// Always 200; a failing store shows up as `degraded`.
pub async fn health_check(State(state): State<AppState>) -> Envelope<HealthResponse> {
    let connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    ok(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}
