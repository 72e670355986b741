// src/models/challenge.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::parse_user_id,
};

/// Kind of challenge a template or completion belongs to.
/// Stored as lowercase text (`math` / `reading`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeType {
    #[serde(alias = "matematicas")]
    Math,
    #[serde(alias = "lectura")]
    Reading,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Math => "math",
            ChallengeType::Reading => "reading",
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "math" | "matematicas" => Ok(ChallengeType::Math),
            "reading" | "lectura" => Ok(ChallengeType::Reading),
            other => Err(AppError::BadRequest(format!(
                "Unknown challenge type '{}'",
                other
            ))),
        }
    }
}

/// Age band a template is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "A6_7")]
    SixToSeven,
    #[serde(rename = "A8_10")]
    EightToTen,
    #[serde(rename = "A11_13")]
    ElevenToThirteen,
    #[serde(rename = "A14_15")]
    FourteenToFifteen,
}

/// An entry of the static challenge bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeTemplate {
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    pub question: String,
    /// Ordered answer options, at least two.
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
}

impl ChallengeTemplate {
    /// Checks the structural rules every template must satisfy.
    pub fn check(&self) -> AppResult<()> {
        if self.question.trim().is_empty() {
            return Err(AppError::BadRequest("question must not be empty".to_string()));
        }
        if self.options.len() < 2 {
            return Err(AppError::BadRequest(
                "a challenge needs at least two options".to_string(),
            ));
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(AppError::BadRequest(format!("option {} must not be empty", index)));
        }
        if self.correct_answer < 0 || self.correct_answer as usize >= self.options.len() {
            return Err(AppError::BadRequest(format!(
                "correctAnswer {} is out of range for {} options",
                self.correct_answer,
                self.options.len()
            )));
        }
        Ok(())
    }
}

/// The single in-progress challenge of a user.
/// Question and options are snapshots taken at assignment time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveChallenge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_type: ChallengeType,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i32,
    pub started_at: DateTime<Utc>,
}

impl ActiveChallenge {
    pub fn from_template(user_id: Uuid, template: ChallengeTemplate, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            challenge_type: template.challenge_type,
            question: template.question,
            options: template.options,
            correct_answer: template.correct_answer,
            started_at,
        }
    }
}

/// Represents the 'active_challenges' table in the database.
#[derive(Debug, FromRow)]
pub struct ActiveChallengeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_type: String,
    pub question: String,
    pub options: Json<Vec<String>>,
    pub correct_answer: i32,
    pub started_at: DateTime<Utc>,
}

impl TryFrom<ActiveChallengeRow> for ActiveChallenge {
    type Error = AppError;

    fn try_from(row: ActiveChallengeRow) -> Result<Self, Self::Error> {
        let challenge_type = row
            .challenge_type
            .parse()
            .map_err(|_| AppError::InternalServerError(format!(
                "active challenge {} has unknown type '{}'",
                row.id, row.challenge_type
            )))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            challenge_type,
            question: row.question,
            options: row.options.0,
            correct_answer: row.correct_answer,
            started_at: row.started_at,
        })
    }
}

/// Wire shape of an active challenge, with elapsed time computed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveChallengeView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i32,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: i64,
}

impl ActiveChallengeView {
    pub fn new(challenge: ActiveChallenge, elapsed_seconds: i64) -> Self {
        Self {
            id: challenge.id,
            challenge_type: challenge.challenge_type,
            question: challenge.question,
            options: challenge.options,
            correct_answer: challenge.correct_answer,
            started_at: challenge.started_at,
            elapsed_seconds,
        }
    }
}

/// `userId` query parameter shared by the active-challenge and history endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

/// DTO for assigning a challenge.
///
/// Either the full template (`type`, `question`, `options`, `correctAnswer`) is supplied,
/// or none of `question`/`options`/`correctAnswer` is and the server draws from the catalog
/// using the optional `type` and `ageGroup` filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignChallengeRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub challenge_type: Option<ChallengeType>,
    pub age_group: Option<AgeGroup>,
    #[validate(length(min = 1, max = 2000))]
    pub question: Option<String>,
    #[validate(length(min = 2))]
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<i32>,
}

/// Where the challenge for an assignment comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentSource {
    Template(ChallengeTemplate),
    Catalog {
        challenge_type: Option<ChallengeType>,
        age_group: Option<AgeGroup>,
    },
}

impl AssignChallengeRequest {
    /// Validates the request and splits it into the target user and the challenge source.
    pub fn into_source(self) -> AppResult<(Uuid, AssignmentSource)> {
        self.validate()?;
        let user_id = parse_user_id(self.user_id.as_deref())?;

        let source = match (self.question, self.options, self.correct_answer) {
            (None, None, None) => AssignmentSource::Catalog {
                challenge_type: self.challenge_type,
                age_group: self.age_group,
            },
            (Some(question), Some(options), Some(correct_answer)) => {
                let challenge_type = self.challenge_type.ok_or_else(|| {
                    AppError::BadRequest("type is required with a supplied challenge".to_string())
                })?;
                let template = ChallengeTemplate {
                    challenge_type,
                    question,
                    options,
                    correct_answer,
                    age_group: self.age_group,
                };
                template.check()?;
                AssignmentSource::Template(template)
            }
            _ => {
                return Err(AppError::BadRequest(
                    "question, options and correctAnswer must be supplied together".to_string(),
                ));
            }
        };

        Ok((user_id, source))
    }
}
