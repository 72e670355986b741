// src/repositories/completion_repository.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::completion::{CompletedChallenge, CompletedChallengeRow},
};

/// Append-only ledger storage. Rows are never updated; `delete_all` is the only removal.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    async fn insert(&self, record: CompletedChallenge) -> AppResult<CompletedChallenge>;
    /// Rows with `completed_at >= since`, or every row when `since` is `None`.
    async fn list_since(&self, since: Option<DateTime<Utc>>) -> AppResult<Vec<CompletedChallenge>>;
    /// A user's rows, oldest first.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CompletedChallenge>>;
    /// Removes every row and returns how many were removed.
    async fn delete_all(&self) -> AppResult<u64>;
}

const COMPLETION_COLUMNS: &str = "id, user_id, type AS challenge_type, question, time_in_seconds, \
     is_correct, points, completed_at, week_start";

pub struct PgCompletionRepository {
    pool: PgPool,
}

impl PgCompletionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_records(rows: Vec<CompletedChallengeRow>) -> AppResult<Vec<CompletedChallenge>> {
    rows.into_iter().map(CompletedChallenge::try_from).collect()
}

#[async_trait]
impl CompletionRepository for PgCompletionRepository {
    async fn insert(&self, record: CompletedChallenge) -> AppResult<CompletedChallenge> {
        sqlx::query(
            r#"
            INSERT INTO completed_challenges
            (id, user_id, type, question, time_in_seconds, is_correct, points, completed_at, week_start)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.challenge_type.as_str())
        .bind(&record.question)
        .bind(record.time_in_seconds)
        .bind(record.is_correct)
        .bind(record.points)
        .bind(record.completed_at)
        .bind(record.week_start)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record completion for {}: {:?}", record.user_id, e);
            AppError::from(e)
        })?;

        Ok(record)
    }

    async fn list_since(&self, since: Option<DateTime<Utc>>) -> AppResult<Vec<CompletedChallenge>> {
        let sql = format!(
            r#"
            SELECT {COMPLETION_COLUMNS}
            FROM completed_challenges
            WHERE ($1::TIMESTAMPTZ IS NULL OR completed_at >= $1)
            ORDER BY completed_at, id
            "#
        );
        let rows = sqlx::query_as::<_, CompletedChallengeRow>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to read completions: {:?}", e);
                AppError::from(e)
            })?;

        into_records(rows)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CompletedChallenge>> {
        let sql = format!(
            "SELECT {COMPLETION_COLUMNS} FROM completed_challenges \
             WHERE user_id = $1 ORDER BY completed_at, id"
        );
        let rows = sqlx::query_as::<_, CompletedChallengeRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to read history of {}: {:?}", user_id, e);
                AppError::from(e)
            })?;

        into_records(rows)
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM completed_challenges")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to reset completions: {:?}", e);
                AppError::from(e)
            })?;
        Ok(result.rows_affected())
    }
}

#[derive(Default)]
pub struct InMemoryCompletionRepository {
    records: Arc<RwLock<Vec<CompletedChallenge>>>,
}

impl InMemoryCompletionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionRepository for InMemoryCompletionRepository {
    async fn insert(&self, record: CompletedChallenge) -> AppResult<CompletedChallenge> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(AppError::Conflict(format!(
                "Completion '{}' already recorded",
                record.id
            )));
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn list_since(&self, since: Option<DateTime<Utc>>) -> AppResult<Vec<CompletedChallenge>> {
        let records = self.records.read().await;
        let mut rows: Vec<CompletedChallenge> = records
            .iter()
            .filter(|r| since.is_none_or(|s| r.completed_at >= s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.completed_at.cmp(&b.completed_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CompletedChallenge>> {
        let records = self.records.read().await;
        let mut rows: Vec<CompletedChallenge> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.completed_at.cmp(&b.completed_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let removed = records.len() as u64;
        records.clear();
        Ok(removed)
    }
}
