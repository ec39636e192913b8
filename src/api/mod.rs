//! REST API endpoints.
//!
//! Axum-based HTTP API over the record store plus the statistics derived
//! from it. Everything lives under `/api`; an optional static directory
//! serves the dashboard frontend for every other path.

pub mod routes;
pub mod state;

use axum::{
    body::Bytes,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::ingest::ImportError;
use crate::normalize::ValidationError;
use crate::storage::StorageError;
use routes::{archive, improvements, matches, meta, player_ranks, scratchpad, stats};
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::error!("Storage failure: {}", err);
        ApiError::Internal("storage operation failed".to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InvalidBundle => ApiError::BadRequest(err.to_string()),
            ImportError::Storage(e) => e.into(),
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
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Parse a JSON request body.
///
/// Bodies are read as raw bytes so that malformed JSON and shape errors
/// come back in the same error envelope as validation failures.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::EmptyPayload.into());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e)))?;
    if value.is_null() {
        return Err(ValidationError::EmptyPayload.into());
    }
    serde_json::from_value(value)
        .map_err(|e| ApiError::from(ValidationError::Malformed(e.to_string())))
}

/// `{"deleted": n}` for bulk deletes.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: usize,
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

    /// Index of the first item on this page. Saturates instead of wrapping.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }

    /// The slice of `items` on this page; empty past the end.
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
    match origin {
        "*" => layer.allow_origin(Any),
        other => match HeaderValue::from_str(other) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", other);
                layer
            }
        },
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(meta::health))
        .route("/seasons", get(meta::list_seasons))
        .route("/vocabulary", get(meta::vocabulary))
        .route(
            "/matches",
            get(matches::list_matches)
                .post(matches::create_match)
                .delete(matches::delete_all_matches),
        )
        .route("/matches/export", get(matches::export_matches))
        .route("/matches/import", axum::routing::post(matches::import_matches))
        .route(
            "/matches/:id",
            axum::routing::delete(matches::delete_match),
        )
        .route(
            "/improvements",
            get(improvements::list_improvements)
                .post(improvements::create_improvement)
                .delete(improvements::delete_all_improvements),
        )
        .route(
            "/improvements/:id",
            axum::routing::patch(improvements::toggle_improvement)
                .delete(improvements::delete_improvement),
        )
        .route(
            "/archive-links",
            get(archive::list_links)
                .post(archive::create_link)
                .delete(archive::delete_all_links),
        )
        .route(
            "/archive-links/:id",
            axum::routing::delete(archive::delete_link),
        )
        .route(
            "/player-ranks",
            get(player_ranks::list_ranks).put(player_ranks::upsert_rank),
        )
        .route("/stats/dashboard", get(stats::dashboard))
        .route("/stats/players/:name/matches", get(stats::player_matches))
        .route(
            "/scratchpad",
            get(scratchpad::get_scratchpad).put(scratchpad::put_scratchpad),
        );

    let mut app = Router::new()
        .nest("/api", api)
        .layer(cors_layer(&state.http.cors_origin));

    if let Some(dir) = state.http.static_dir.as_ref() {
        let index = dir.join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    let access_log = state.http.access_log;
    let app = app.with_state(state);
    if access_log {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}
