// src/handlers/challenge.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    extractors::AppJson,
    models::{
        challenge::{AssignChallengeRequest, UserIdQuery},
        user::parse_user_id,
    },
    state::AppState,
};

/// Returns the caller's in-progress challenge, or `null`.
///
/// `elapsedSeconds` is measured by the server on every call.
pub async fn get_active(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_user_id(query.user_id.as_deref())?;
    let active = state.challenges.get_active(user_id).await?;

    Ok(Json(json!({ "activeChallenge": active })))
}

/// Starts a new challenge for a user, replacing any previous one.
///
/// The body either carries the full challenge or only optional `type`/`ageGroup`
/// filters, in which case one is drawn from the catalog.
pub async fn assign(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AssignChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user_id, source) = payload.into_source()?;
    let active = state.challenges.assign(user_id, source).await?;

    Ok(Json(json!({
        "success": true,
        "activeChallenge": active,
    })))
}

/// Abandons the caller's challenge. Succeeds even when there is none.
pub async fn clear(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_user_id(query.user_id.as_deref())?;
    state.challenges.clear(user_id).await?;

    Ok(Json(json!({ "success": true })))
}
