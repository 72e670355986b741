// src/models/leaderboard.rs

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Time window a leaderboard is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Week,
    Month,
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::All => "all",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            other => Err(AppError::BadRequest(format!(
                "period must be one of week, month, all (got '{}')",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub period: Option<String>,
}

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub nickname: String,
    pub total_points: i64,
    pub correct_count: i64,
    pub total_count: i64,
    /// Percentage of correct answers, 0 when nothing was answered.
    pub accuracy: f64,
    /// Completions per challenge type inside the window.
    pub challenges_by_type: BTreeMap<String, i64>,
    /// 1-based position among visible students.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub period: Period,
    /// Lower bound of the window; absent for `all`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<DateTime<Utc>>,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Set when the store was unreachable and the last good result is served instead.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
}
