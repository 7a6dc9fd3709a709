/// Success envelope
///
/// Every successful response has the shape
///
/// ```json
/// { "success": true, "data": ..., "error": null, "meta": { "page": 1, "limit": 20, "total": 42 } }
/// ```
///
/// `meta` is only present on paginated listings.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use taskhub_shared::models::{Page, Pagination};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

pub type Envelope<T> = Json<ApiResponse<T>>;

/// 200 with `data`
pub fn ok<T: Serialize>(data: T) -> Envelope<T> {
    Json(ApiResponse {
        success: true,
        data,
        error: None,
        meta: None,
    })
}

/// 201 with `data`
pub fn created<T: Serialize>(data: T) -> (StatusCode, Envelope<T>) {
    (StatusCode::CREATED, ok(data))
}

/// 200 with one page of items and its pagination meta
pub fn paged<T: Serialize>(page: Page<T>, pagination: Pagination) -> Envelope<Vec<T>> {
    Json(ApiResponse {
        success: true,
        data: page.items,
        error: None,
        meta: Some(Meta {
            page: pagination.page,
            limit: pagination.limit,
            total: page.total,
        }),
    })
}
