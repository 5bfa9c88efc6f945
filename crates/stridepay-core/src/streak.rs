//! Consecutive-day streak tracking.
//!
//! A day qualifies when its step count meets the daily threshold.
//! Evaluation is keyed by calendar date: once a date has been recorded
//! as qualifying, re-running the evaluation for that date is a no-op,
//! so replays never double-count. Reaching the milestone length awards
//! a one-time bonus credit and starts a new cycle.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Tunables for streak tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Daily steps required for a day to qualify.
    #[serde(default = "default_qualifying_threshold")]
    pub qualifying_threshold: u64,
    /// Streak length that triggers the one-time bonus credit.
    #[serde(default = "default_milestone_days")]
    pub milestone_days: u32,
    /// Bonus credit in currency subunits, paid once per completed cycle.
    #[serde(default = "default_milestone_bonus")]
    pub milestone_bonus: i64,
}

fn default_qualifying_threshold() -> u64 {
    5_000
}
fn default_milestone_days() -> u32 {
    7
}
fn default_milestone_bonus() -> i64 {
    500
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            qualifying_threshold: default_qualifying_threshold(),
            milestone_days: default_milestone_days(),
            milestone_bonus: default_milestone_bonus(),
        }
    }
}

/// Per-user streak state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakState {
    pub user_id: String,
    pub current_days: u32,
    pub longest_days: u32,
    pub last_qualifying_date: Option<NaiveDate>,
    /// Guards against double-awarding within one cycle.
    pub bonus_awarded_for_cycle: bool,
}

/// Result of evaluating one day's steps against the streak rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakOutcome {
    /// Whether this evaluation changed the streak state.
    pub qualified: bool,
    /// Streak length to use when valuing this day's steps. On the
    /// milestone day this is the pre-reset count, so the milestone day
    /// itself still enjoys the streak rate bonus.
    pub days_for_rate: u32,
    /// Bonus credit issued by this evaluation, if any.
    pub milestone_bonus: Option<i64>,
}

impl StreakState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_days: 0,
            longest_days: 0,
            last_qualifying_date: None,
            bonus_awarded_for_cycle: false,
        }
    }

    /// Streak length in effect for `date`, for rate purposes.
    ///
    /// After a milestone reset the counter is 0, but the day the
    /// milestone fired still counts at the milestone length.
    pub fn effective_days(&self, date: NaiveDate, milestone_days: u32) -> u32 {
        if self.last_qualifying_date == Some(date)
            && self.current_days == 0
            && self.bonus_awarded_for_cycle
        {
            milestone_days
        } else {
            self.current_days
        }
    }

    /// Evaluate one day's cumulative steps. Idempotent per date: a date
    /// already recorded as qualifying is not processed again.
    pub fn evaluate(&mut self, date: NaiveDate, steps: u64, config: &StreakConfig) -> StreakOutcome {
        if self.last_qualifying_date == Some(date) {
            return StreakOutcome {
                qualified: false,
                days_for_rate: self.effective_days(date, config.milestone_days),
                milestone_bonus: None,
            };
        }

        if steps < config.qualifying_threshold {
            return StreakOutcome {
                qualified: false,
                days_for_rate: self.current_days,
                milestone_bonus: None,
            };
        }

        let yesterday = date - Duration::days(1);
        if self.last_qualifying_date == Some(yesterday) && self.current_days > 0 {
            self.current_days += 1;
        } else {
            // Broken chain, first ever qualifying day, or the first day
            // of a fresh cycle after a milestone reset.
            self.current_days = 1;
            self.bonus_awarded_for_cycle = false;
        }
        self.last_qualifying_date = Some(date);
        self.longest_days = self.longest_days.max(self.current_days);

        let days_for_rate = self.current_days;
        let mut milestone_bonus = None;
        if self.current_days >= config.milestone_days && !self.bonus_awarded_for_cycle {
            milestone_bonus = Some(config.milestone_bonus);
            self.bonus_awarded_for_cycle = true;
            self.current_days = 0;
        }

        StreakOutcome {
            qualified: true,
            days_for_rate,
            milestone_bonus,
        }
    }
}
