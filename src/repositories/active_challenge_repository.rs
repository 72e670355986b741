// src/repositories/active_challenge_repository.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::challenge::{ActiveChallenge, ActiveChallengeRow},
};

/// Storage of in-progress challenges, keyed uniquely by user.
#[async_trait]
pub trait ActiveChallengeRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<ActiveChallenge>>;
    /// Atomically replaces whatever the user had with `challenge`.
    async fn replace(&self, challenge: ActiveChallenge) -> AppResult<ActiveChallenge>;
    /// Removes the user's active challenge and returns it, if there was one.
    async fn take(&self, user_id: Uuid) -> AppResult<Option<ActiveChallenge>>;
}

const ACTIVE_COLUMNS: &str =
    "id, user_id, type AS challenge_type, question, options, correct_answer, started_at";

pub struct PgActiveChallengeRepository {
    pool: PgPool,
}

impl PgActiveChallengeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActiveChallengeRepository for PgActiveChallengeRepository {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<ActiveChallenge>> {
        let sql = format!("SELECT {ACTIVE_COLUMNS} FROM active_challenges WHERE user_id = $1");
        let row = sqlx::query_as::<_, ActiveChallengeRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch active challenge for {}: {:?}", user_id, e);
                AppError::from(e)
            })?;

        row.map(ActiveChallenge::try_from).transpose()
    }

    async fn replace(&self, challenge: ActiveChallenge) -> AppResult<ActiveChallenge> {
        // The unique index on user_id makes this a single-writer upsert: the later write wins.
        let sql = format!(
            r#"
            INSERT INTO active_challenges
            (id, user_id, type, question, options, correct_answer, started_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                id = EXCLUDED.id,
                type = EXCLUDED.type,
                question = EXCLUDED.question,
                options = EXCLUDED.options,
                correct_answer = EXCLUDED.correct_answer,
                started_at = EXCLUDED.started_at
            RETURNING {ACTIVE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ActiveChallengeRow>(&sql)
            .bind(challenge.id)
            .bind(challenge.user_id)
            .bind(challenge.challenge_type.as_str())
            .bind(&challenge.question)
            .bind(Json(&challenge.options))
            .bind(challenge.correct_answer)
            .bind(challenge.started_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to store active challenge for {}: {:?}",
                    challenge.user_id,
                    e
                );
                AppError::from(e)
            })?;

        ActiveChallenge::try_from(row)
    }

    async fn take(&self, user_id: Uuid) -> AppResult<Option<ActiveChallenge>> {
        let sql = format!("DELETE FROM active_challenges WHERE user_id = $1 RETURNING {ACTIVE_COLUMNS}");
        let row = sqlx::query_as::<_, ActiveChallengeRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear active challenge for {}: {:?}", user_id, e);
                AppError::from(e)
            })?;

        row.map(ActiveChallenge::try_from).transpose()
    }
}

#[derive(Default)]
pub struct InMemoryActiveChallengeRepository {
    challenges: Arc<RwLock<HashMap<Uuid, ActiveChallenge>>>,
}

impl InMemoryActiveChallengeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActiveChallengeRepository for InMemoryActiveChallengeRepository {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<ActiveChallenge>> {
        let challenges = self.challenges.read().await;
        Ok(challenges.get(&user_id).cloned())
    }

    async fn replace(&self, challenge: ActiveChallenge) -> AppResult<ActiveChallenge> {
        let mut challenges = self.challenges.write().await;
        challenges.insert(challenge.user_id, challenge.clone());
        Ok(challenge)
    }

    async fn take(&self, user_id: Uuid) -> AppResult<Option<ActiveChallenge>> {
        let mut challenges = self.challenges.write().await;
        Ok(challenges.remove(&user_id))
    }
}
