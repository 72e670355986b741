// src/services/scoring.rs

use crate::models::challenge::ChallengeType;

/// Points awarded for a correct answer.
pub const POINTS_PER_CORRECT: i32 = 10;

/// Maps the facts of a completion to points. Implementations must be total and
/// deterministic.
pub trait ScoringPolicy: Send + Sync {
    fn score(&self, challenge_type: ChallengeType, is_correct: bool, time_in_seconds: i32) -> i32;
}

/// Same value for every correct answer regardless of type or time; incorrect answers score 0.
#[derive(Debug, Clone, Copy)]
pub struct FlatScoring {
    pub points_per_correct: i32,
}

impl Default for FlatScoring {
    fn default() -> Self {
        Self {
            points_per_correct: POINTS_PER_CORRECT,
        }
    }
}

impl ScoringPolicy for FlatScoring {
    fn score(&self, _challenge_type: ChallengeType, is_correct: bool, _time_in_seconds: i32) -> i32 {
        if is_correct { self.points_per_correct } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incorrect_scores_zero() {
        let policy = FlatScoring::default();
        for t in [ChallengeType::Math, ChallengeType::Reading] {
            for secs in [0, 5, 3_600, i32::MAX] {
                assert_eq!(policy.score(t, false, secs), 0);
            }
        }
    }

    #[test]
    fn test_correct_scores_flat_baseline() {
        let policy = FlatScoring::default();
        assert_eq!(policy.score(ChallengeType::Math, true, 3), POINTS_PER_CORRECT);
        assert_eq!(policy.score(ChallengeType::Reading, true, 900), POINTS_PER_CORRECT);
    }

    #[test]
    fn test_score_is_deterministic() {
        let policy = FlatScoring::default();
        let first = policy.score(ChallengeType::Reading, true, 42);
        let second = policy.score(ChallengeType::Reading, true, 42);
        assert_eq!(first, second);
    }
}
