// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extractors::AppJson,
    models::user::{CreateStudentRequest, UpdateVisibilityRequest, User},
    state::AppState,
    utils::{
        hash::{hash_secret, verify_secret},
        jwt::{AdminProof, Claims, ROLE_ADMIN, sign_jwt},
    },
};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

/// Exchanges the admin password for a bearer token.
pub async fn login(
    State(config): State<Config>,
    AppJson(payload): AppJson<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password_hash = config
        .admin_password_hash
        .as_deref()
        .ok_or_else(|| AppError::AuthError("Admin login is disabled".to_string()))?;

    if !verify_secret(&payload.password, password_hash)? {
        tracing::warn!("Rejected admin login attempt");
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let token = sign_jwt(ROLE_ADMIN, ROLE_ADMIN, &config.jwt_secret, config.jwt_expiration)?;
    Ok(Json(json!({ "token": token })))
}

/// Lists students, newest first.
/// Admin only.
pub async fn list_students(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let students = state.roster.list_students().await?;
    Ok(Json(students))
}

/// Creates a student with a hashed 4-digit PIN.
/// Admin only.
pub async fn create_student(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.nickname = payload.nickname.trim().to_string();
    payload.validate()?;

    let pin_hash = hash_secret(&payload.pin)?;
    let mut student = User::new_student(&payload.nickname, pin_hash, Utc::now());
    student.first_name = payload.first_name;
    student.last_name = payload.last_name;
    student.desescolarizado = payload.desescolarizado;

    let student = state.roster.create(student).await?;
    tracing::info!("Student '{}' created", student.nickname);

    Ok((StatusCode::CREATED, Json(student)))
}

/// Removes a student and their in-progress challenge. Completions are kept.
/// Admin only.
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proof = AdminProof::from_claims(&claims)?;
    state.challenges.remove_student(proof, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Shows or hides a user on the public leaderboard.
/// Admin only.
pub async fn update_visibility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateVisibilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hidden = payload
        .hidden
        .ok_or_else(|| AppError::BadRequest("hidden is required".to_string()))?;

    let user = state
        .roster
        .set_hidden(id, hidden)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))?;
    tracing::info!("User {} hidden={}", id, hidden);

    Ok(Json(user))
}

/// Wipes every completion. Irreversible.
/// Admin only.
pub async fn reset_points(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let proof = AdminProof::from_claims(&claims)?;
    let deleted = state.challenges.reset_ledger(proof).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("{} completed challenges deleted", deleted),
        "deletedCount": deleted,
    })))
}
