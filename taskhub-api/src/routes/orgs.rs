/// Organization endpoints
///
/// - `GET /api/v1/orgs/:org_id` - Organization details
/// - `PUT /api/v1/orgs/:org_id` - Update name, plan or limits (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, ClientIp},
    response::{ok, Envelope},
    routes::OrgPath,
};
use axum::{extract::State, Extension};
use taskhub_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::AuthContext,
    },
    models::organization::{Organization, UpdateOrganization},
    services::Caller,
    tenancy::TenantScope,
};

pub async fn get_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<Organization>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Organization)?;

    let org = state
        .store
        .find_organization(&scope)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(ok(org))
}

pub async fn update_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgPath>,
    AppJson(req): AppJson<UpdateOrganization>,
) -> ApiResult<Envelope<Organization>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Update, Resource::Organization)?;

    let org = state
        .accounts
        .update_organization(&scope, &Caller::new(&auth, ip), req)
        .await?;

    Ok(ok(org))
}
