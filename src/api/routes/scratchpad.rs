use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{parse_body, ApiError};
use crate::models::Timestamp;
use crate::storage::Scratchpad;

#[derive(Debug, Deserialize)]
pub struct ScratchpadUpdate {
    pub content: String,
}

pub async fn get_scratchpad(State(state): State<AppState>) -> Result<Json<Scratchpad>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.scratchpad()?))
}

/// Replace the pad content. Concurrent writers simply overwrite each other.
pub async fn put_scratchpad(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Scratchpad>, ApiError> {
    let update: ScratchpadUpdate = parse_body(&body)?;
    let pad = state
        .store
        .write()
        .await
        .save_scratchpad(update.content, Timestamp::now())?;
    Ok(Json(pad))
}
