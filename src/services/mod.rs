// src/services/mod.rs

pub mod active_challenge;
pub mod catalog;
pub mod challenge_service;
pub mod leaderboard;
pub mod ledger;
pub mod scoring;
pub mod user_locks;

use std::future::Future;

use crate::error::{AppError, AppResult};

pub use active_challenge::ActiveChallengeStore;
pub use catalog::{CatalogError, ChallengeCatalog};
pub use challenge_service::ChallengeService;
pub use leaderboard::LeaderboardService;
pub use ledger::CompletionLedger;
pub use scoring::{FlatScoring, ScoringPolicy};
pub use user_locks::UserLocks;

/// Runs a write on its own task and waits for it.
///
/// If the caller is dropped (client went away) the task still finishes, so a write is
/// either fully applied or reported as failed, never cut off midway.
pub async fn run_detached<F, T>(write: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(write).await.map_err(|e| {
        tracing::error!("Write task failed: {:?}", e);
        AppError::InternalServerError("write task did not complete".to_string())
    })?
}
