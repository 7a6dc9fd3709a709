/// User endpoints
///
/// - `GET /api/v1/orgs/:org_id/users` - Members of the organization
/// - `PUT /api/v1/orgs/:org_id/users/:id/role` - Change a member's role (admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, ClientIp},
    response::{ok, Envelope},
    routes::{OrgItemPath, OrgPath},
};
use axum::{extract::State, Extension};
use serde::Deserialize;
use taskhub_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::AuthContext,
    },
    models::user::User,
    services::Caller,
    tenancy::TenantScope,
};

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    /// `admin`, `manager` or `member`; anything else is a 400
    #[serde(default)]
    pub role: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<Vec<User>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Users)?;

    Ok(ok(state.store.list_users(&scope).await?))
}

pub async fn change_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgItemPath>,
    AppJson(req): AppJson<RoleRequest>,
) -> ApiResult<Envelope<User>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::ChangeRole, Resource::Users)?;

    let user = state
        .accounts
        .change_role(&scope, &Caller::new(&auth, ip), path.id, &req.role)
        .await?;

    Ok(ok(user))
}
