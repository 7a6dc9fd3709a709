/// Notification endpoints
///
/// Every route works on the caller's own notifications only.
///
/// - `GET /notifications?page&limit&unreadOnly=true`
/// - `GET /notifications/unread-count`
/// - `PUT /notifications/:id/read`
/// - `PUT /notifications/mark-all-read`
/// - `GET /notifications/preferences`
/// - `PUT /notifications/preferences`

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, AppQuery, ClientIp},
    response::{ok, paged, Envelope},
    routes::{OrgItemPath, OrgPath},
};
use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::AuthContext,
    },
    models::{notification::Notification, user::NotificationPrefs, Pagination},
    services::{accounts::PrefsUpdate, Caller},
    tenancy::TenantScope,
};

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,

    /// Only the literal `true` filters
    pub unread_only: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    pub modified_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRequest {
    pub email: Option<bool>,
    pub in_app: Option<bool>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
    AppQuery(query): AppQuery<NotificationQuery>,
) -> ApiResult<Envelope<Vec<Notification>>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Notifications)?;

    let unread_only = query.unread_only.as_deref() == Some("true");
    let pagination = Pagination::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let page = state
        .store
        .list_notifications(&scope, auth.user_id, unread_only, pagination)
        .await?;

    Ok(paged(page, pagination))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<UnreadCount>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Notifications)?;

    let count = state
        .store
        .count_unread_notifications(&scope, auth.user_id)
        .await?;

    Ok(ok(UnreadCount { count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgItemPath>,
) -> ApiResult<Envelope<Notification>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Update, Resource::Notifications)?;

    let notification = state
        .accounts
        .mark_read(&scope, &Caller::new(&auth, ip), path.id)
        .await?;

    Ok(ok(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<MarkAllReadResponse>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Update, Resource::Notifications)?;

    let modified_count = state
        .accounts
        .mark_all_read(&scope, &Caller::new(&auth, ip))
        .await?;

    Ok(ok(MarkAllReadResponse { modified_count }))
}

pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(path): AppPath<OrgPath>,
) -> ApiResult<Envelope<NotificationPrefs>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Read, Resource::Notifications)?;

    let prefs = state
        .accounts
        .notification_prefs(&scope, auth.user_id)
        .await?;

    Ok(ok(prefs))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ClientIp(ip): ClientIp,
    AppPath(path): AppPath<OrgPath>,
    AppJson(req): AppJson<PreferencesRequest>,
) -> ApiResult<Envelope<NotificationPrefs>> {
    let scope = TenantScope::for_path(&auth, path.org_id)?;
    authorize(&auth, Action::Update, Resource::Notifications)?;

    let update = PrefsUpdate {
        email: req.email,
        in_app: req.in_app,
    };
    let prefs = state
        .accounts
        .update_notification_prefs(&scope, &Caller::new(&auth, ip), update)
        .await?;

    Ok(ok(prefs))
}
