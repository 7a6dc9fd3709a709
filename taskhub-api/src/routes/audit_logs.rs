/// Audit log listing
///
/// `GET /api/v1/orgs/:org_id/audit-logs?page&limit&action&resource`, newest first.
/// Admins and managers only.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppPath, AppQuery},
    response::{paged, Envelope},
    routes::OrgPath,
};
use axum::{extract::State, Extension};
use serde::Deserialize;
use taskhub_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::AuthContext,
    },
    models::{
        audit_log::{AuditFilter, AuditLog},
        Pagination,
    },
    tenancy::TenantScope,
};

const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub action: Option<String>,
    pub resource: Option<String>,
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
    AppQuery(query): AppQuery<AuditLogQuery>,
) -> ApiResult<Envelope<Vec<AuditLog>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::AuditLogs)?;

    let filter = AuditFilter {
        action: query.action.filter(|a| !a.is_empty()),
        resource: query.resource.filter(|r| !r.is_empty()),
    };
    let pagination = Pagination::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let page = state.store.list_audit_logs(&scope, &filter, pagination).await?;
    Ok(paged(page, pagination))
}
