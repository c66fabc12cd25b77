//! REST API endpoints.
//!
//! Axum-based HTTP API over the team data store: roster, events,
//! attendance, stat sheets and the derived team overview.

pub mod routes;
pub mod state;

use std::collections::HashMap;

use axum::{
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::models::Role;
use crate::storage::StorageError;
use state::AppState;

/// Header carrying the caller's team role.
pub const ROLE_HEADER: &str = "x-role";

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Pagination parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(50).clamp(1, 100),
        }
    }

    /// Index of the first item on this page. Saturates for absurd pages.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }

    /// The slice of `items` on this page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.page_size as usize).min(items.len());
        &items[start..end]
    }
}

/// Pagination metadata in responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u32) -> Self {
        let total_pages = total_items.div_ceil(pagination.page_size);
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

/// Collapse entities sharing an ID, keeping the last one written.
///
/// Append-only files can hold several versions of an entity; order of
/// first appearance is kept.
pub fn dedup_by_id<T, F>(items: Vec<T>, id: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        let key = id(&item).to_string();
        match index.get(&key) {
            Some(&i) => out[i] = item,
            None => {
                index.insert(key, out.len());
                out.push(item);
            }
        }
    }
    out
}

/// Role named by the request's role header. Absent means player.
pub fn caller_role(headers: &HeaderMap) -> Result<Role, ApiError> {
    match headers.get(ROLE_HEADER) {
        None => Ok(Role::Player),
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("Invalid {} header", ROLE_HEADER)))?
            .parse::<Role>()
            .map_err(ApiError::BadRequest),
    }
}

/// Reject callers who may not change team data.
pub fn require_manager(headers: &HeaderMap) -> Result<Role, ApiError> {
    let role = caller_role(headers)?;
    if !role.can_manage() {
        return Err(ApiError::Forbidden(format!(
            "role '{}' may not modify team data",
            role
        )));
    }
    Ok(role)
}

/// Parse an optional `YYYY-MM-DD` query parameter.
pub fn parse_date_param(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>, ApiError> {
    value
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                ApiError::BadRequest(format!("Invalid {} date (expected YYYY-MM-DD): {}", name, s))
            })
        })
        .transpose()
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
            layer
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/columns", get(routes::columns::list_columns))
        .route(
            "/api/teams",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route(
            "/api/teams/:team/persons",
            get(routes::teams::list_persons).post(routes::teams::create_person),
        )
        .route(
            "/api/teams/:team/events",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route(
            "/api/teams/:team/events/:event",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        )
        .route(
            "/api/teams/:team/events/:event/attendees",
            get(routes::attendance::list_attendees).put(routes::attendance::set_attendance),
        )
        .route(
            "/api/teams/:team/events/:event/stats",
            get(routes::stats::list_stats)
                .post(routes::stats::save_stats)
                .delete(routes::stats::delete_stats),
        )
        .route(
            "/api/teams/:team/events/:event/stats/import",
            axum::routing::post(routes::stats::import_stats),
        )
        .route("/api/teams/:team/stats/:row", patch(routes::stats::edit_stat))
        .route("/api/teams/:team/overview", get(routes::overview::team_overview))
        .route("/api/teams/:team/leaderboard", get(routes::overview::leaderboard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::testing::{get_json, send, setup_test_state};
    use super::*;

    #[test]
    fn test_pagination_default() {
        let p = Pagination::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 50);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_bounds() {
        // Page can't be 0
        let p = Pagination::new(Some(0), Some(50));
        assert_eq!(p.page, 1);

        // Page size max is 100
        let p = Pagination::new(Some(1), Some(200));
        assert_eq!(p.page_size, 100);
    }

    #[test]
    fn test_pagination_slice() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(Pagination::new(Some(3), Some(10)).slice(&items), &[20, 21, 22, 23, 24]);
        assert!(Pagination::new(Some(9), Some(10)).slice(&items).is_empty());
    }

    #[test]
    fn test_pagination_huge_page_is_empty() {
        let p = Pagination::new(Some(u32::MAX), Some(100));
        assert!(p.slice(&[1, 2, 3]).is_empty());
        assert!(Pagination::new(Some(50_000_000), Some(100)).slice(&[1, 2, 3]).is_empty());
    }

    #[test]
    fn test_pagination_meta() {
        let p = Pagination::new(Some(2), Some(10));
        let meta = PaginationMeta::new(&p, 25);

        assert_eq!(meta.page, 2);
        assert_eq!(meta.total_items, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_dedup_by_id_keeps_last_version() {
        let items = vec![("a", 1), ("b", 2), ("a", 3)];
        let deduped = dedup_by_id(items, |item| item.0);
        assert_eq!(deduped, vec![("a", 3), ("b", 2)]);
    }

    #[test]
    fn test_caller_role() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_role(&headers).unwrap(), Role::Player);

        headers.insert(ROLE_HEADER, HeaderValue::from_static("Coach"));
        assert_eq!(caller_role(&headers).unwrap(), Role::Coach);
        assert!(require_manager(&headers).is_ok());

        headers.insert(ROLE_HEADER, HeaderValue::from_static("player"));
        assert!(matches!(
            require_manager(&headers),
            Err(ApiError::Forbidden(_))
        ));

        headers.insert(ROLE_HEADER, HeaderValue::from_static("referee"));
        assert!(matches!(caller_role(&headers), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_parse_date_param() {
        assert_eq!(parse_date_param(None, "from").unwrap(), None);
        assert_eq!(parse_date_param(Some(""), "from").unwrap(), None);
        assert_eq!(
            parse_date_param(Some("2025-03-01"), "from").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert!(parse_date_param(Some("03/01/2025"), "from").is_err());
    }

    #[test]
    fn test_storage_not_found_maps_to_404() {
        let err: ApiError = StorageError::NotFound("team x".to_string()).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let (status, json) = get_json(&state, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let (status, _) = send(&state, "GET", "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
