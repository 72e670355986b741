// src/utils/time.rs

//! Window boundaries and the clock abstraction.
//!
//! Every "current week" or "current month" decision in the crate goes through
//! [`week_start`] / [`month_start`] with an explicit `now`, so the ledger writer and the
//! leaderboard reader always round the same way.

use std::sync::Mutex;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::models::leaderboard::Period;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Midnight of `date` in `offset`, expressed in UTC.
fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, Utc)
}

/// Monday 00:00 (in `offset`) on or before `now`. Sundays belong to the week that started
/// six days earlier.
pub fn week_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let days_back = i64::from(local.weekday().num_days_from_monday());
    local_midnight(local.date_naive() - Duration::days(days_back), offset)
}

/// First day of the month 00:00 (in `offset`) containing `now`.
pub fn month_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let days_back = i64::from(local.day0());
    local_midnight(local.date_naive() - Duration::days(days_back), offset)
}

/// Lower bound of `period` at `now`; `None` means unbounded.
pub fn window_start(period: Period, now: DateTime<Utc>, offset: FixedOffset) -> Option<DateTime<Utc>> {
    match period {
        Period::Week => Some(week_start(now, offset)),
        Period::Month => Some(month_start(now, offset)),
        Period::All => None,
    }
}

/// Whole seconds between `started_at` and `now`, floored and never negative.
pub fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_seconds().max(0)
}
