use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Discrete milestones produced by the core engines.
/// A presentation layer consumes these to render celebrations or
/// notifications; the core never renders or schedules anything itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The user advanced to a new tier.
    TierAdvanced {
        new_tier: u32,
        label: String,
        base_rate: f64,
        at: DateTime<Utc>,
    },
    /// Tier completion crossed a quarter boundary (25, 50 or 75 percent).
    QuarterMilestone {
        tier: u32,
        quarter: u8,
        at: DateTime<Utc>,
    },
    /// A qualifying day extended the current streak.
    StreakExtended {
        days: u32,
        at: DateTime<Utc>,
    },
    /// The streak reached its milestone length; a one-time bonus credit
    /// was issued and a new cycle begins.
    StreakMilestone {
        days: u32,
        bonus_amount: i64,
        at: DateTime<Utc>,
    },
    /// One day's pending units were committed into the wallet.
    RedemptionSucceeded {
        date: NaiveDate,
        amount: i64,
        new_balance: i64,
        at: DateTime<Utc>,
    },
}
