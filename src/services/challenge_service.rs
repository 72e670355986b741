// src/services/challenge_service.rs

use std::sync::{Arc, Mutex};

use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        challenge::{ActiveChallengeView, AssignmentSource, ChallengeTemplate},
        completion::{CompletedChallenge, CompletionSubmission},
        user::User,
    },
    repositories::RosterRepository,
    services::{
        ActiveChallengeStore, ChallengeCatalog, CompletionLedger, UserLocks, run_detached,
    },
    utils::jwt::AdminProof,
};

/// Entry point for everything that touches a user's active challenge.
///
/// Every mutating call takes the user's lock first, so assign, clear, submit and student
/// removal for one user are linearized; writes run detached so they always finish.
#[derive(Clone)]
pub struct ChallengeService {
    roster: Arc<dyn RosterRepository>,
    active: ActiveChallengeStore,
    ledger: CompletionLedger,
    catalog: Arc<ChallengeCatalog>,
    rng: Arc<Mutex<StdRng>>,
    locks: Arc<UserLocks>,
}

impl ChallengeService {
    pub fn new(
        roster: Arc<dyn RosterRepository>,
        active: ActiveChallengeStore,
        ledger: CompletionLedger,
        catalog: ChallengeCatalog,
    ) -> Self {
        Self::with_rng(roster, active, ledger, catalog, StdRng::from_os_rng())
    }

    /// Same as `new` with a caller-chosen generator, e.g. a seeded one in tests.
    pub fn with_rng(
        roster: Arc<dyn RosterRepository>,
        active: ActiveChallengeStore,
        ledger: CompletionLedger,
        catalog: ChallengeCatalog,
        rng: StdRng,
    ) -> Self {
        Self {
            roster,
            active,
            ledger,
            catalog: Arc::new(catalog),
            rng: Arc::new(Mutex::new(rng)),
            locks: Arc::new(UserLocks::new()),
        }
    }

    async fn require_user(&self, user_id: Uuid) -> AppResult<User> {
        self.roster
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", user_id)))
    }

    fn draw(&self, source: AssignmentSource) -> ChallengeTemplate {
        match source {
            AssignmentSource::Template(template) => template,
            AssignmentSource::Catalog {
                challenge_type,
                age_group,
            } => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                self.catalog
                    .pick(&mut *rng, challenge_type, age_group)
                    .clone()
            }
        }
    }

    pub async fn get_active(&self, user_id: Uuid) -> AppResult<Option<ActiveChallengeView>> {
        self.active.get_active(user_id).await
    }

    /// Gives the user a new challenge, superseding any previous one.
    pub async fn assign(&self, user_id: Uuid, source: AssignmentSource) -> AppResult<ActiveChallengeView> {
        let this = self.clone();
        run_detached(async move {
            let _guard = this.locks.lock(user_id).await;
            this.require_user(user_id).await?;
            let template = this.draw(source);
            let challenge = this.active.assign(user_id, template).await?;
            Ok(ActiveChallengeView::new(challenge, 0))
        })
        .await
    }

    pub async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        let this = self.clone();
        run_detached(async move {
            let _guard = this.locks.lock(user_id).await;
            this.active.clear(user_id).await
        })
        .await
    }

    /// Records an answer. When the user has an active challenge, the time is measured by the
    /// server and the challenge is closed; otherwise the submitted time is kept.
    pub async fn submit(&self, submission: CompletionSubmission) -> AppResult<CompletedChallenge> {
        let this = self.clone();
        run_detached(async move {
            let user_id = submission.user_id;
            let _guard = this.locks.lock(user_id).await;
            this.require_user(user_id).await?;

            // An active challenge is the source of truth for what was answered and for how long.
            let active = this.active.get_active(user_id).await?;
            let had_active = active.is_some();
            let (challenge_type, question, time_in_seconds) = match active {
                Some(view) => {
                    if view.question != submission.question {
                        tracing::debug!("Submission for {} differs from its active challenge", user_id);
                    }
                    (
                        view.challenge_type,
                        view.question,
                        i32::try_from(view.elapsed_seconds).unwrap_or(i32::MAX),
                    )
                }
                None => (
                    submission.challenge_type,
                    submission.question,
                    submission.time_in_seconds,
                ),
            };

            let record = this
                .ledger
                .record(
                    user_id,
                    challenge_type,
                    question,
                    time_in_seconds,
                    submission.is_correct,
                )
                .await?;

            if had_active {
                // Record is durable at this point; the next assignment replaces a leftover.
                if let Err(e) = this.active.clear(user_id).await {
                    tracing::error!("Completion recorded but clear failed for {}: {}", user_id, e);
                }
            }
            Ok(record)
        })
        .await
    }

    /// A user's completions, oldest first.
    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<CompletedChallenge>> {
        self.require_user(user_id).await?;
        self.ledger.history(user_id).await
    }

    pub async fn reset_ledger(&self, proof: AdminProof) -> AppResult<u64> {
        let ledger = self.ledger.clone();
        run_detached(async move { ledger.reset_all(&proof).await }).await
    }

    /// Deletes a student and their active challenge. Their ledger rows stay.
    pub async fn remove_student(&self, proof: AdminProof, user_id: Uuid) -> AppResult<()> {
        let this = self.clone();
        run_detached(async move {
            let _guard = this.locks.lock(user_id).await;
            if !this.roster.delete(user_id).await? {
                return Err(AppError::NotFound(format!("User '{}' not found", user_id)));
            }
            this.active.clear(user_id).await?;
            tracing::info!("Student {} removed by '{}'", user_id, proof.subject());
            Ok(())
        })
        .await
    }
}
