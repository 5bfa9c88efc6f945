//! Redemption outcome types and the attempt rate limit.
//!
//! The redemption state machine itself runs in [`crate::engine`]; this
//! module holds the vocabulary: the terminal statuses a redemption
//! call can resolve to, the caller-facing outcome, and the trailing
//! rate-limit window applied before any state is touched.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of a redemption call.
///
/// Every call resolves to exactly one of these; nothing is silently
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// The day's pending units were committed.
    Succeeded,
    /// This day (or this idempotency key) was redeemed earlier; the
    /// original amount and balance are replayed. Success-shaped, so
    /// naive client retries converge.
    AlreadyProcessed,
    /// No earnings recorded for that date. Not retryable for the date.
    NoRecord,
    /// Too many attempts inside the trailing window. Retry later.
    RateLimited,
    /// Another redemption for the same user and date is in flight.
    /// Retry after it settles.
    Concurrent,
    /// Storage fault during commit; the ledger is untouched. Safe to
    /// retry with the same idempotency key.
    Failed,
}

impl RedemptionStatus {
    /// Whether the caller may usefully retry after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RedemptionStatus::RateLimited | RedemptionStatus::Concurrent | RedemptionStatus::Failed
        )
    }
}

/// Caller-facing result of a redemption call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionOutcome {
    pub status: RedemptionStatus,
    /// Units credited (or originally credited, on replay).
    pub amount: Option<i64>,
    /// Wallet balance after the commit (or the recorded balance, on
    /// replay).
    pub new_balance: Option<i64>,
}

impl RedemptionOutcome {
    pub fn bare(status: RedemptionStatus) -> Self {
        Self {
            status,
            amount: None,
            new_balance: None,
        }
    }

    pub fn settled(status: RedemptionStatus, amount: i64, new_balance: i64) -> Self {
        Self {
            status,
            amount: Some(amount),
            new_balance: Some(new_balance),
        }
    }
}

/// Trailing-window attempt limit.
///
/// Attempts are counted from the persisted attempt log, so the limit
/// holds across process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_window_secs() -> i64 {
    60
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitPolicy {
    /// Start of the trailing window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::seconds(self.window_secs)
    }

    /// Whether a new attempt is allowed given the number of attempts
    /// already made inside the window.
    pub fn allows(&self, attempts_in_window: u32) -> bool {
        attempts_in_window < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(RedemptionStatus::RateLimited.is_retryable());
        assert!(RedemptionStatus::Concurrent.is_retryable());
        assert!(RedemptionStatus::Failed.is_retryable());
        assert!(!RedemptionStatus::Succeeded.is_retryable());
        assert!(!RedemptionStatus::AlreadyProcessed.is_retryable());
        assert!(!RedemptionStatus::NoRecord.is_retryable());
    }

    #[test]
    fn default_policy_allows_up_to_five() {
        let policy = RateLimitPolicy::default();
        assert!(policy.allows(0));
        assert!(policy.allows(4));
        assert!(!policy.allows(5));
        assert!(!policy.allows(50));
    }

    #[test]
    fn window_start_is_trailing() {
        let policy = RateLimitPolicy {
            max_attempts: 5,
            window_secs: 60,
        };
        let now = Utc::now();
        assert_eq!(now - policy.window_start(now), Duration::seconds(60));
    }
}
