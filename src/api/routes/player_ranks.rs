use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{parse_body, ApiError};
use crate::models::{PlayerRank, RankUpdate};
use crate::normalize::validate_rank_update;

#[derive(Debug, Deserialize)]
pub struct ListRanksParams {
    pub season: Option<String>,
}

/// Ranks for one season. The season is required.
pub async fn list_ranks(
    State(state): State<AppState>,
    Query(params): Query<ListRanksParams>,
) -> Result<Json<Vec<PlayerRank>>, ApiError> {
    let season = params
        .season
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("season is required".to_string()))?;

    let store = state.store.read().await;
    Ok(Json(store.list_ranks(&season)?))
}

pub async fn upsert_rank(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PlayerRank>, ApiError> {
    let update: RankUpdate = parse_body(&body)?;
    let key = validate_rank_update(&update)?;

    let stored = state.store.write().await.upsert_rank(key, update.rank)?;
    Ok(Json(stored))
}
