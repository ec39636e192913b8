use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::api::state::AppState;
use crate::api::{parse_body, ApiError, DeletedResponse};
use crate::models::{ArchiveLink, LinkDraft};
use crate::normalize::{normalize_link, validate_link};

pub async fn list_links(State(state): State<AppState>) -> Result<Json<Vec<ArchiveLink>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_links()?))
}

pub async fn create_link(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ArchiveLink>), ApiError> {
    let draft: LinkDraft = parse_body(&body)?;
    validate_link(&draft)?;

    let link = normalize_link(draft, Utc::now());
    state.store.write().await.upsert_link(&link)?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn delete_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.write().await.delete_link(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("archive link {}", id)))
    }
}

pub async fn delete_all_links(State(state): State<AppState>) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted = state.store.write().await.delete_all_links()?;
    Ok(Json(DeletedResponse { deleted }))
}
