use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::Value;

use crate::api::state::AppState;
use crate::api::{parse_body, ApiError, DeletedResponse};
use crate::ingest::{import_bundle, ExportBundle, ImportBundle, ImportReport};
use crate::models::{MatchDraft, MatchRecord};
use crate::normalize::{log_vocabulary_gaps, normalize_match, validate_match};

pub const EXPORT_FILENAME: &str = "matches-export.json";

pub async fn list_matches(State(state): State<AppState>) -> Result<Json<Vec<MatchRecord>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_matches()?))
}

/// Upsert by id. Responds with the record as stored.
pub async fn create_match(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<MatchRecord>), ApiError> {
    let draft: MatchDraft = parse_body(&body)?;
    validate_match(&draft)?;

    let record = normalize_match(draft, Utc::now(), &state.seasons);
    log_vocabulary_gaps(&record, &state.queues);

    state.store.write().await.upsert_match(&record)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_all_matches(State(state): State<AppState>) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted = state.store.write().await.delete_all_matches()?;
    Ok(Json(DeletedResponse { deleted }))
}

pub async fn delete_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.write().await.delete_match(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("match {}", id)))
    }
}

pub async fn export_matches(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bundle = {
        let store = state.store.read().await;
        ExportBundle::collect(&store, Utc::now())?
    };
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILENAME);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(bundle)))
}

pub async fn import_matches(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportReport>, ApiError> {
    let value: Value = parse_body(&body)?;
    let bundle = ImportBundle::parse(value)?;
    let mut store = state.store.write().await;
    let report = import_bundle(&mut store, bundle, Utc::now(), &state.seasons)?;
    Ok(Json(report))
}
