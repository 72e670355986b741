// src/handlers/completion.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    extractors::AppJson,
    models::{
        challenge::UserIdQuery,
        completion::{CompleteChallengeRequest, CompletionHistory},
        user::parse_user_id,
    },
    state::AppState,
};

/// Records an answered challenge and returns the stored row with its points.
pub async fn complete(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CompleteChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission = payload.into_submission()?;
    let record = state.challenges.submit(submission).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_user_id(query.user_id.as_deref())?;
    let challenges = state.challenges.history(user_id).await?;

    Ok(Json(CompletionHistory { challenges }))
}
