// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    repositories::{Repositories, RosterRepository},
    services::{
        ActiveChallengeStore, ChallengeCatalog, ChallengeService, CompletionLedger, FlatScoring,
        LeaderboardService,
    },
    utils::time::Clock,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub roster: Arc<dyn RosterRepository>,
    pub challenges: ChallengeService,
    pub leaderboard: Arc<LeaderboardService>,
}

impl AppState {
    /// Wires the services over `repos`. Week and month windows use the configured offset.
    pub fn new(
        config: Config,
        repos: Repositories,
        catalog: ChallengeCatalog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let offset = config.week_offset();

        let active = ActiveChallengeStore::new(repos.active.clone(), clock.clone());
        let ledger = CompletionLedger::new(
            repos.completions.clone(),
            Arc::new(FlatScoring::default()),
            clock.clone(),
            offset,
        );
        let challenges = ChallengeService::new(repos.roster.clone(), active, ledger, catalog);
        let leaderboard = Arc::new(LeaderboardService::new(
            repos.roster.clone(),
            repos.completions,
            clock,
            offset,
        ));

        Self {
            config,
            roster: repos.roster,
            challenges,
            leaderboard,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
