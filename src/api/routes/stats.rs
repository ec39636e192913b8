use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::calculate::{
    compute_dashboard, in_roster, player_history, HistorySortKey, PlayerMatchView, SortDirection,
    StatsQuery,
};
use crate::models::{Dashboard, Role};

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub role: Option<String>,
    pub season: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerMatchesParams {
    pub role: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PlayerMatchesResponse {
    pub player: String,
    pub matches: Vec<PlayerMatchView>,
    pub pagination: PaginationMeta,
}

/// Empty strings mean "no filter", as the dashboard sends `role=` for "all".
fn parse_role(raw: Option<&str>) -> Result<Option<Role>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse::<Role>().map(Some).map_err(ApiError::BadRequest),
        None => Ok(None),
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<Dashboard>, ApiError> {
    let query = StatsQuery {
        role: parse_role(params.role.as_deref())?,
        season: params.season.filter(|s| !s.trim().is_empty()),
    };

    let matches = state.store.read().await.list_matches()?;
    Ok(Json(compute_dashboard(
        &matches,
        &state.stats,
        &state.seasons,
        &query,
        Utc::now(),
    )))
}

pub async fn player_matches(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<PlayerMatchesParams>,
) -> Result<Json<PlayerMatchesResponse>, ApiError> {
    if !in_roster(&state.stats, &name) {
        return Err(ApiError::NotFound(format!("player {}", name)));
    }

    let role = parse_role(params.role.as_deref())?;
    let key = match params.sort.as_deref() {
        Some(raw) => raw.parse::<HistorySortKey>().map_err(ApiError::BadRequest)?,
        None => HistorySortKey::default(),
    };
    let direction = match params.direction.as_deref() {
        Some(raw) => raw.parse::<SortDirection>().map_err(ApiError::BadRequest)?,
        None => SortDirection::default(),
    };

    let matches = state.store.read().await.list_matches()?;
    let history = player_history(&matches, &name, role, key, direction);

    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, history.len() as u32);
    let page = pagination.slice(&history).to_vec();

    Ok(Json(PlayerMatchesResponse {
        player: name,
        matches: page,
        pagination: meta,
    }))
}
