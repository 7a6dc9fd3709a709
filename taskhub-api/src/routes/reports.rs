/// Dashboard and report endpoints
///
/// Relative to `/api/v1/orgs/:org_id`:
///
/// - `GET /dashboard/stats`
/// - `GET /reports/task-distribution`
/// - `GET /reports/tasks-over-time?days=30`
/// - `GET /reports/team-workload`

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppPath, AppQuery},
    response::{ok, Envelope},
    routes::OrgPath,
};
use axum::{extract::State, Extension};
use serde::Deserialize;
use taskhub_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::AuthContext,
    },
    reports::{self, DailyCount, DashboardStats, Distribution, Workload, DEFAULT_REPORT_DAYS},
    tenancy::TenantScope,
};

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<DashboardStats>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Dashboard)?;

    Ok(ok(reports::dashboard(state.store.as_ref(), &scope).await?))
}

pub async fn task_distribution(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<Distribution>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Reports)?;

    Ok(ok(reports::task_distribution(state.store.as_ref(), &scope).await?))
}

pub async fn tasks_over_time(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
    AppQuery(query): AppQuery<DaysQuery>,
) -> ApiResult<Envelope<Vec<DailyCount>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Reports)?;

    let days = query.days.unwrap_or(DEFAULT_REPORT_DAYS);
    Ok(ok(reports::tasks_over_time(state.store.as_ref(), &scope, days).await?))
}

pub async fn team_workload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<Vec<Workload>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Reports)?;

    Ok(ok(reports::workload(state.store.as_ref(), &scope).await?))
}
