// src/handlers/leaderboard.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::leaderboard::{LeaderboardQuery, Period},
    state::AppState,
};

/// Ranked students for `?period=week|month|all` (default `week`).
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let period = match query.period.as_deref() {
        None | Some("") => Period::default(),
        Some(raw) => raw.parse()?,
    };
    let response = state.leaderboard.compute(period).await?;

    Ok(Json(response))
}
