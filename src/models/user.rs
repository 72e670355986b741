// src/models/user.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

pub const ROLE_STUDENT: &str = "student";

static PIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}$").expect("PIN pattern is valid"));

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Unique, case-sensitive login key.
    pub nickname: String,

    /// Argon2 PIN hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip_serializing, default)]
    pub pin: String,

    /// User role: 'student' or 'admin'.
    pub role: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,

    /// Excluded from the public leaderboard, still scored.
    pub hidden: bool,

    /// Marks out-of-school students for statistics. No effect on scoring.
    pub desescolarizado: bool,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new_student(nickname: &str, pin_hash: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname: nickname.to_string(),
            pin: pin_hash,
            role: ROLE_STUDENT.to_string(),
            first_name: None,
            last_name: None,
            hidden: false,
            desescolarizado: false,
            created_at,
        }
    }

    pub fn is_student(&self) -> bool {
        self.role == ROLE_STUDENT
    }
}

/// Parses a user id coming from a query string or JSON body.
pub fn parse_user_id(raw: Option<&str>) -> AppResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;

    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid userId '{}'", raw)))
}

/// DTO for an admin creating a student.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[validate(custom(function = validate_nickname))]
    pub nickname: String,
    #[validate(regex(path = *PIN_PATTERN, message = "PIN must be exactly 4 digits."))]
    pub pin: String,
    #[validate(length(max = 60))]
    pub first_name: Option<String>,
    #[validate(length(max = 60))]
    pub last_name: Option<String>,
    #[serde(default)]
    pub desescolarizado: bool,
}

/// Length is counted on the trimmed nickname, which is what gets stored.
fn validate_nickname(nickname: &str) -> Result<(), validator::ValidationError> {
    let len = nickname.trim().chars().count();
    if !(2..=30).contains(&len) {
        return Err(validator::ValidationError::new("nickname_length")
            .with_message("Nickname length must be between 2 and 30 characters.".into()));
    }
    Ok(())
}

/// DTO for toggling leaderboard visibility.
#[derive(Debug, Deserialize)]
pub struct UpdateVisibilityRequest {
    pub hidden: Option<bool>,
}
