use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::api::state::AppState;
use crate::models::vocabulary::Vocabulary;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonInfo {
    pub label: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub current: bool,
}

/// The season table with the season of "now" flagged.
pub async fn list_seasons(State(state): State<AppState>) -> Json<Vec<SeasonInfo>> {
    let current = state.seasons.resolve(Utc::now());
    let seasons = state
        .seasons
        .all()
        .iter()
        .map(|s| SeasonInfo {
            label: s.label.clone(),
            start: s.start,
            end: state.seasons.end_of(&s.label),
            current: s.label == current,
        })
        .collect();
    Json(seasons)
}

pub async fn vocabulary(State(state): State<AppState>) -> Json<Vocabulary> {
    Json(Vocabulary::new(
        state.stats.roster.clone(),
        &state.queues.ranked,
        &state.queues.special,
    ))
}
