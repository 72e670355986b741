// src/models/completion.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{challenge::ChallengeType, user::parse_user_id},
};

/// An immutable record of one finished attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedChallenge {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    /// Question text as shown to the student.
    pub question: String,
    pub time_in_seconds: i32,
    pub is_correct: bool,
    pub points: i32,
    pub completed_at: DateTime<Utc>,
    /// Monday 00:00 of the week `completed_at` falls in.
    pub week_start: DateTime<Utc>,
}

/// Represents the 'completed_challenges' table in the database.
#[derive(Debug, FromRow)]
pub struct CompletedChallengeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_type: String,
    pub question: String,
    pub time_in_seconds: i32,
    pub is_correct: bool,
    pub points: i32,
    pub completed_at: DateTime<Utc>,
    pub week_start: DateTime<Utc>,
}

impl TryFrom<CompletedChallengeRow> for CompletedChallenge {
    type Error = AppError;

    fn try_from(row: CompletedChallengeRow) -> Result<Self, Self::Error> {
        let challenge_type = row.challenge_type.parse().map_err(|_| {
            AppError::InternalServerError(format!(
                "completed challenge {} has unknown type '{}'",
                row.id, row.challenge_type
            ))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            challenge_type,
            question: row.question,
            time_in_seconds: row.time_in_seconds,
            is_correct: row.is_correct,
            points: row.points,
            completed_at: row.completed_at,
            week_start: row.week_start,
        })
    }
}

/// DTO for submitting an answered challenge.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteChallengeRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub challenge_type: Option<ChallengeType>,
    #[validate(length(min = 1, max = 2000))]
    pub question: Option<String>,
    /// Client-side timer; superseded by the server clock when an active challenge exists.
    #[validate(range(min = 0))]
    pub time_in_seconds: Option<i32>,
    pub is_correct: Option<bool>,
}

impl CompleteChallengeRequest {
    pub fn into_submission(self) -> AppResult<CompletionSubmission> {
        self.validate()?;

        let user_id = parse_user_id(self.user_id.as_deref())?;
        let challenge_type = self
            .challenge_type
            .ok_or_else(|| AppError::BadRequest("type is required".to_string()))?;
        let question = self
            .question
            .ok_or_else(|| AppError::BadRequest("question is required".to_string()))?;
        let time_in_seconds = self
            .time_in_seconds
            .ok_or_else(|| AppError::BadRequest("timeInSeconds is required".to_string()))?;
        let is_correct = self
            .is_correct
            .ok_or_else(|| AppError::BadRequest("isCorrect is required".to_string()))?;

        Ok(CompletionSubmission {
            user_id,
            challenge_type,
            question,
            time_in_seconds,
            is_correct,
        })
    }
}

/// A validated completion submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSubmission {
    pub user_id: Uuid,
    pub challenge_type: ChallengeType,
    pub question: String,
    pub time_in_seconds: i32,
    pub is_correct: bool,
}

/// Response body listing a student's history.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionHistory {
    pub challenges: Vec<CompletedChallenge>,
}
