/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register a user, creating or joining an organization
/// - `POST /api/v1/auth/login` - Login to an organization and get a token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, ClientIp},
    response::{created, ok, Envelope},
};
use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use taskhub_shared::services::accounts::{Credentials, Registration, Session};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked for strength by the account service
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Organization display name; its slug picks the organization to join
    #[serde(default)]
    #[validate(length(max = 100, message = "Organization name must be at most 100 characters"))]
    pub org_name: String,
}

/// Login request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub org_slug: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "SecureP@ss123",
///   "orgName": "Acme Corp"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJ...",
///     "user": { "id": "uuid", "name": "Ada Lovelace", "email": "ada@example.com", "role": "admin", "orgId": "uuid" }
///   },
///   "error": null
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields, bad email or weak password
/// - `409 Conflict`: Email already registered in the organization
pub async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Envelope<Session>)> {
    if [&req.name, &req.email, &req.password, &req.org_name]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    }
    req.validate()?;

    let session = state
        .accounts
        .register(
            Registration {
                name: req.name,
                email: req.email,
                password: req.password,
                org_name: req.org_name,
            },
            ip,
        )
        .await?;

    Ok(created(session))
}

/// Login to an organization
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// Content-Type: application/json
///
/// { "email": "ada@example.com", "password": "SecureP@ss123", "orgSlug": "acme-corp" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: A field is missing
/// - `404 Not Found`: Unknown organization
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Envelope<Session>> {
    let session = state
        .accounts
        .login(Credentials {
            email: req.email,
            password: req.password,
            org_slug: req.org_slug,
        })
        .await?;

    Ok(ok(session))
}
