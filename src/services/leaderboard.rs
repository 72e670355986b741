// src/services/leaderboard.rs

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        completion::CompletedChallenge,
        leaderboard::{LeaderboardEntry, LeaderboardResponse, Period},
        user::User,
    },
    repositories::{CompletionRepository, RosterRepository},
    utils::time::{Clock, window_start},
};

/// Ranks `roster` by the points they earned in `completions`.
///
/// Hidden users and non-students are dropped before ranking, so the visible top user is
/// always rank 1. Users without completions appear with zeroed stats. Order is
/// `total_points` desc, then nickname asc, then id asc; ranks are sequential.
pub fn rank(roster: &[User], completions: &[CompletedChallenge]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = roster
        .iter()
        .filter(|u| u.is_student() && !u.hidden)
        .map(|u| LeaderboardEntry {
            user_id: u.id,
            nickname: u.nickname.clone(),
            total_points: 0,
            correct_count: 0,
            total_count: 0,
            accuracy: 0.0,
            challenges_by_type: BTreeMap::new(),
            rank: 0,
        })
        .collect();

    let index: HashMap<Uuid, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.user_id, i))
        .collect();

    for c in completions {
        let Some(&i) = index.get(&c.user_id) else {
            continue;
        };
        let entry = &mut entries[i];
        entry.total_points += i64::from(c.points);
        entry.total_count += 1;
        if c.is_correct {
            entry.correct_count += 1;
        }
        *entry
            .challenges_by_type
            .entry(c.challenge_type.as_str().to_string())
            .or_insert(0) += 1;
    }

    for entry in entries.iter_mut() {
        if entry.total_count > 0 {
            entry.accuracy = entry.correct_count as f64 / entry.total_count as f64 * 100.0;
        }
    }

    entries.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.nickname.cmp(&b.nickname))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position + 1;
    }

    entries
}

/// Computes leaderboards from the roster and ledger, remembering the last good answer per
/// period for when the store is unreachable.
pub struct LeaderboardService {
    roster: Arc<dyn RosterRepository>,
    completions: Arc<dyn CompletionRepository>,
    clock: Arc<dyn Clock>,
    week_offset: FixedOffset,
    last_good: RwLock<HashMap<Period, LeaderboardResponse>>,
}

impl LeaderboardService {
    pub fn new(
        roster: Arc<dyn RosterRepository>,
        completions: Arc<dyn CompletionRepository>,
        clock: Arc<dyn Clock>,
        week_offset: FixedOffset,
    ) -> Self {
        Self {
            roster,
            completions,
            clock,
            week_offset,
            last_good: RwLock::new(HashMap::new()),
        }
    }

    pub async fn compute(&self, period: Period) -> AppResult<LeaderboardResponse> {
        self.compute_at(period, self.clock.now()).await
    }

    pub async fn compute_at(&self, period: Period, now: DateTime<Utc>) -> AppResult<LeaderboardResponse> {
        match self.fresh(period, now).await {
            Ok(response) => {
                self.last_good.write().await.insert(period, response.clone());
                Ok(response)
            }
            Err(e) if e.is_store_unavailable() => {
                let cached = self.last_good.read().await.get(&period).cloned();
                match cached {
                    Some(mut response) => {
                        tracing::warn!("Serving stale {} leaderboard: {}", period, e);
                        response.stale = true;
                        Ok(response)
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn fresh(&self, period: Period, now: DateTime<Utc>) -> AppResult<LeaderboardResponse> {
        let since = window_start(period, now, self.week_offset);
        let roster = self.roster.list_students().await?;
        let completions = self.completions.list_since(since).await?;

        Ok(LeaderboardResponse {
            period,
            week_start: since,
            leaderboard: rank(&roster, &completions),
            stale: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::challenge::ChallengeType,
        repositories::{InMemoryCompletionRepository, InMemoryRosterRepository},
        utils::time::FixedClock,
    };
    use async_trait::async_trait;
    use chrono::{Duration, Offset, TimeZone};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn student(nickname: &str) -> User {
        User::new_student(nickname, "hash".to_string(), now())
    }

    fn completion(user: &User, at: DateTime<Utc>, is_correct: bool) -> CompletedChallenge {
        CompletedChallenge {
            id: Uuid::new_v4(),
            user_id: user.id,
            challenge_type: ChallengeType::Math,
            question: "q".to_string(),
            time_in_seconds: 5,
            is_correct,
            points: if is_correct { 10 } else { 0 },
            completed_at: at,
            week_start: crate::utils::time::week_start(at, Utc.fix()),
        }
    }

    async fn service_with(
        roster: Vec<User>,
        completions: Vec<CompletedChallenge>,
    ) -> LeaderboardService {
        let roster_repo = Arc::new(InMemoryRosterRepository::new());
        for u in roster {
            roster_repo.create(u).await.unwrap();
        }
        let completion_repo = Arc::new(InMemoryCompletionRepository::new());
        for c in completions {
            completion_repo.insert(c).await.unwrap();
        }
        LeaderboardService::new(
            roster_repo,
            completion_repo,
            Arc::new(FixedClock::new(now())),
            Utc.fix(),
        )
    }

    #[tokio::test]
    async fn test_week_and_all_windows() {
        let a = student("ana");
        let b = student("beto");
        let last_week = now() - Duration::days(7);
        let mut rows = vec![completion(&a, last_week, true)];
        for i in 0..3 {
            rows.push(completion(&a, now() - Duration::hours(i), true));
        }
        for i in 0..2 {
            rows.push(completion(&b, now() - Duration::hours(i), true));
        }
        let service = service_with(vec![a.clone(), b.clone()], rows).await;

        let week = service.compute(Period::Week).await.unwrap();
        assert_eq!(week.week_start, Some(Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap()));
        assert_eq!(week.leaderboard[0].user_id, a.id);
        assert_eq!(week.leaderboard[0].total_points, 30);
        assert_eq!(week.leaderboard[0].rank, 1);
        assert_eq!(week.leaderboard[1].user_id, b.id);
        assert_eq!(week.leaderboard[1].total_points, 20);
        assert_eq!(week.leaderboard[1].rank, 2);

        let all = service.compute(Period::All).await.unwrap();
        assert_eq!(all.week_start, None);
        assert_eq!(all.leaderboard[0].total_points, 40);
    }

    #[tokio::test]
    async fn test_hidden_user_is_excluded_before_ranking() {
        let mut c = student("carla");
        c.hidden = true;
        let a = student("ana");
        let mut rows = vec![];
        for _ in 0..5 {
            rows.push(completion(&c, now(), true));
        }
        rows.push(completion(&a, now(), true));
        let service = service_with(vec![a.clone(), c.clone()], rows).await;

        let week = service.compute(Period::Week).await.unwrap();
        assert!(week.leaderboard.iter().all(|e| e.user_id != c.id));
        assert_eq!(week.leaderboard[0].user_id, a.id);
        assert_eq!(week.leaderboard[0].rank, 1);
    }

    #[tokio::test]
    async fn test_reset_leaves_all_zero_board() {
        let a = student("ana");
        let rows: Vec<_> = (0..50).map(|_| completion(&a, now(), true)).collect();
        let roster_repo = Arc::new(InMemoryRosterRepository::new());
        roster_repo.create(a.clone()).await.unwrap();
        let completion_repo = Arc::new(InMemoryCompletionRepository::new());
        for r in rows {
            completion_repo.insert(r).await.unwrap();
        }
        let service = LeaderboardService::new(
            roster_repo,
            completion_repo.clone(),
            Arc::new(FixedClock::new(now())),
            Utc.fix(),
        );

        assert_eq!(completion_repo.delete_all().await.unwrap(), 50);
        let all = service.compute(Period::All).await.unwrap();
        assert_eq!(all.leaderboard.len(), 1);
        assert_eq!(all.leaderboard[0].total_points, 0);
        assert_eq!(all.leaderboard[0].total_count, 0);
    }

    #[test]
    fn test_zero_attempts_have_zero_accuracy() {
        let a = student("ana");
        let ranked = rank(&[a], &[]);
        assert_eq!(ranked[0].accuracy, 0.0);
        assert!(ranked[0].challenges_by_type.is_empty());
    }

    #[test]
    fn test_accuracy_and_type_breakdown() {
        let a = student("ana");
        let mut reading = completion(&a, now(), false);
        reading.challenge_type = ChallengeType::Reading;
        let rows = vec![
            completion(&a, now(), true),
            completion(&a, now(), true),
            reading,
            completion(&a, now(), false),
        ];
        let ranked = rank(&[a], &rows);
        assert_eq!(ranked[0].correct_count, 2);
        assert_eq!(ranked[0].total_count, 4);
        assert_eq!(ranked[0].accuracy, 50.0);
        assert_eq!(ranked[0].challenges_by_type.get("math"), Some(&3));
        assert_eq!(ranked[0].challenges_by_type.get("reading"), Some(&1));
    }

    #[test]
    fn test_ties_break_by_nickname_with_sequential_ranks() {
        let zoe = student("zoe");
        let ana = student("ana");
        let rows = vec![completion(&zoe, now(), true), completion(&ana, now(), true)];
        let ranked = rank(&[zoe, ana], &rows);
        assert_eq!(ranked[0].nickname, "ana");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].nickname, "zoe");
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_completions_of_removed_users_are_ignored() {
        let a = student("ana");
        let ghost = student("ghost");
        let rows = vec![completion(&ghost, now(), true)];
        let ranked = rank(&[a], &rows);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].total_points, 0);
    }

    struct FlakyCompletions {
        inner: InMemoryCompletionRepository,
        down: AtomicBool,
    }

    #[async_trait]
    impl CompletionRepository for FlakyCompletions {
        async fn insert(&self, record: CompletedChallenge) -> AppResult<CompletedChallenge> {
            self.inner.insert(record).await
        }
        async fn list_since(&self, since: Option<DateTime<Utc>>) -> AppResult<Vec<CompletedChallenge>> {
            if self.down.load(Ordering::SeqCst) {
                return Err(AppError::StoreUnavailable("pool timed out".to_string()));
            }
            self.inner.list_since(since).await
        }
        async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CompletedChallenge>> {
            self.inner.list_for_user(user_id).await
        }
        async fn delete_all(&self) -> AppResult<u64> {
            self.inner.delete_all().await
        }
    }

    #[tokio::test]
    async fn test_store_outage_serves_last_good_result() {
        let a = student("ana");
        let roster_repo = Arc::new(InMemoryRosterRepository::new());
        roster_repo.create(a.clone()).await.unwrap();
        let flaky = Arc::new(FlakyCompletions {
            inner: InMemoryCompletionRepository::new(),
            down: AtomicBool::new(false),
        });
        flaky.insert(completion(&a, now(), true)).await.unwrap();
        let service = LeaderboardService::new(
            roster_repo,
            flaky.clone(),
            Arc::new(FixedClock::new(now())),
            Utc.fix(),
        );

        let fresh = service.compute(Period::Week).await.unwrap();
        assert!(!fresh.stale);

        flaky.down.store(true, Ordering::SeqCst);
        let stale = service.compute(Period::Week).await.unwrap();
        assert!(stale.stale);
        assert_eq!(stale.leaderboard, fresh.leaderboard);

        // Nothing cached for this period yet
        assert_eq!(
            service.compute(Period::Month).await,
            Err(AppError::StoreUnavailable("pool timed out".to_string()))
        );
    }
}
