// src/services/ledger.rs

use std::sync::Arc;

use chrono::FixedOffset;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{challenge::ChallengeType, completion::CompletedChallenge},
    repositories::CompletionRepository,
    services::scoring::ScoringPolicy,
    utils::{
        jwt::AdminProof,
        time::{Clock, week_start},
    },
};

/// Append-only record of finished attempts.
#[derive(Clone)]
pub struct CompletionLedger {
    repo: Arc<dyn CompletionRepository>,
    scoring: Arc<dyn ScoringPolicy>,
    clock: Arc<dyn Clock>,
    week_offset: FixedOffset,
}

impl CompletionLedger {
    pub fn new(
        repo: Arc<dyn CompletionRepository>,
        scoring: Arc<dyn ScoringPolicy>,
        clock: Arc<dyn Clock>,
        week_offset: FixedOffset,
    ) -> Self {
        Self {
            repo,
            scoring,
            clock,
            week_offset,
        }
    }

    /// Scores the attempt and writes it as a new row stamped with the current week.
    pub async fn record(
        &self,
        user_id: Uuid,
        challenge_type: ChallengeType,
        question: String,
        time_in_seconds: i32,
        is_correct: bool,
    ) -> AppResult<CompletedChallenge> {
        let completed_at = self.clock.now();
        let record = CompletedChallenge {
            id: Uuid::new_v4(),
            user_id,
            challenge_type,
            question,
            time_in_seconds,
            is_correct,
            points: self.scoring.score(challenge_type, is_correct, time_in_seconds),
            completed_at,
            week_start: week_start(completed_at, self.week_offset),
        };

        let stored = self.repo.insert(record).await?;
        tracing::info!(
            "User {} completed a {} challenge in {}s (correct: {}, points: {})",
            user_id,
            stored.challenge_type,
            stored.time_in_seconds,
            stored.is_correct,
            stored.points
        );
        Ok(stored)
    }

    /// A user's completions, oldest first.
    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<CompletedChallenge>> {
        self.repo.list_for_user(user_id).await
    }

    /// Deletes the whole ledger. Irreversible.
    pub async fn reset_all(&self, proof: &AdminProof) -> AppResult<u64> {
        let deleted = self.repo.delete_all().await?;
        tracing::warn!(
            "Ledger reset by '{}': {} completions deleted",
            proof.subject(),
            deleted
        );
        Ok(deleted)
    }
}
