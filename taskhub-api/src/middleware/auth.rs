/// JWT authentication middleware
///
/// Validates the `Authorization: Bearer <token>` header and injects the
/// resulting [`AuthContext`] into request extensions. Handlers behind this
/// layer read it with `Extension<AuthContext>`.
///
/// The `:org_id` path segment is checked against the token's organization
/// here, before any handler extractor runs, so a foreign organization is
/// always a 403 even when the rest of the request is malformed.

use axum::{
    extract::{RawPathParams, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use taskhub_shared::{
    auth::{
        authorization::AccessError,
        middleware::{authenticate_bearer, AuthContext},
    },
    tenancy::TenantScope,
};
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth: AuthContext = authenticate_bearer(header, state.jwt_secret())?;

    if let Some((_, raw)) = params.iter().find(|(name, _)| *name == "org_id") {
        check_path_org(&auth, raw)?;
    }

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

fn check_path_org(auth: &AuthContext, raw: &str) -> Result<(), AccessError> {
    match raw.parse::<Uuid>() {
        Ok(path_org_id) => TenantScope::for_path(auth, path_org_id).map(|_| ()),
        Err(_) => {
            tracing::warn!(
                user_id = %auth.user_id,
                org_id = %auth.org_id,
                requested_org_id = %raw,
                "Cross-tenant request rejected"
            );
            Err(AccessError::CrossTenant)
        }
    }
}
