// src/services/active_challenge.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::challenge::{ActiveChallenge, ActiveChallengeView, ChallengeTemplate},
    repositories::ActiveChallengeRepository,
    utils::time::{Clock, elapsed_seconds},
};

/// Tracks the one challenge each user is working on.
///
/// Callers that need several of these calls to behave as one step (assign after a user
/// check, take during completion) must hold the user's guard from `UserLocks`.
#[derive(Clone)]
pub struct ActiveChallengeStore {
    repo: Arc<dyn ActiveChallengeRepository>,
    clock: Arc<dyn Clock>,
}

impl ActiveChallengeStore {
    pub fn new(repo: Arc<dyn ActiveChallengeRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// The user's current challenge with its elapsed time measured now.
    pub async fn get_active(&self, user_id: Uuid) -> AppResult<Option<ActiveChallengeView>> {
        let challenge = self.repo.find_by_user(user_id).await?;
        let now = self.clock.now();
        Ok(challenge.map(|c| {
            let elapsed = elapsed_seconds(c.started_at, now);
            ActiveChallengeView::new(c, elapsed)
        }))
    }

    /// Replaces any existing challenge with a fresh snapshot of `template` started now.
    pub async fn assign(&self, user_id: Uuid, template: ChallengeTemplate) -> AppResult<ActiveChallenge> {
        let challenge = ActiveChallenge::from_template(user_id, template, self.clock.now());
        let stored = self.repo.replace(challenge).await?;
        tracing::info!(
            "Assigned {} challenge {} to user {}",
            stored.challenge_type,
            stored.id,
            user_id
        );
        Ok(stored)
    }

    /// Removes the user's challenge. Clearing nothing is not an error.
    pub async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        if self.repo.take(user_id).await?.is_some() {
            tracing::info!("Cleared active challenge of user {}", user_id);
        }
        Ok(())
    }

    /// Removes and returns the user's challenge.
    pub async fn take(&self, user_id: Uuid) -> AppResult<Option<ActiveChallenge>> {
        self.repo.take(user_id).await
    }
}
