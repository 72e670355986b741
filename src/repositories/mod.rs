// src/repositories/mod.rs

pub mod active_challenge_repository;
pub mod completion_repository;
pub mod roster_repository;

use std::sync::Arc;

use sqlx::PgPool;

pub use active_challenge_repository::{
    ActiveChallengeRepository, InMemoryActiveChallengeRepository, PgActiveChallengeRepository,
};
pub use completion_repository::{
    CompletionRepository, InMemoryCompletionRepository, PgCompletionRepository,
};
pub use roster_repository::{InMemoryRosterRepository, PgRosterRepository, RosterRepository};

/// The set of stores the services run against.
#[derive(Clone)]
pub struct Repositories {
    pub roster: Arc<dyn RosterRepository>,
    pub active: Arc<dyn ActiveChallengeRepository>,
    pub completions: Arc<dyn CompletionRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            roster: Arc::new(PgRosterRepository::new(pool.clone())),
            active: Arc::new(PgActiveChallengeRepository::new(pool.clone())),
            completions: Arc::new(PgCompletionRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            roster: Arc::new(InMemoryRosterRepository::new()),
            active: Arc::new(InMemoryActiveChallengeRepository::new()),
            completions: Arc::new(InMemoryCompletionRepository::new()),
        }
    }
}
