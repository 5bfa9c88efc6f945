//! Wallet ledger data types.
//!
//! The wallet holds the durable balance plus lifetime totals; every
//! balance change is mirrored by an append-only [`Transaction`]. Daily
//! earnings live in their own per-date records until redeemed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable per-user wallet. Created lazily with zero balances.
///
/// The core only ever increases `balance` and `total_earned` together
/// by the same amount; spending is a separate path outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletLedger {
    pub user_id: String,
    pub balance: i64,
    pub total_earned: i64,
    pub total_redeemed: i64,
    pub last_updated: DateTime<Utc>,
}

impl WalletLedger {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            balance: 0,
            total_earned: 0,
            total_redeemed: 0,
            last_updated: Utc::now(),
        }
    }
}

/// Kind of ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// A day's pending units committed by the redemption engine.
    Redemption,
    /// One-time streak milestone credit.
    StreakBonus,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Redemption => "redemption",
            TransactionKind::StreakBonus => "streak_bonus",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "redemption" => Some(TransactionKind::Redemption),
            "streak_bonus" => Some(TransactionKind::StreakBonus),
            _ => None,
        }
    }
}

/// Append-only audit record. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: impl Into<String>,
        kind: TransactionKind,
        amount: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind,
            amount,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

/// One user's earnings for one calendar date.
///
/// `pending_units` is recomputed from the day's cumulative steps each
/// time steps are recorded; it is never accumulated. Once redeemed the
/// record is immutable history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEarningRecord {
    pub user_id: String,
    pub date: NaiveDate,
    pub steps: u64,
    pub pending_units: i64,
    pub is_redeemed: bool,
}

/// Status of a redemption attempt, persisted per idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Succeeded,
    Failed,
    AlreadyProcessed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Succeeded => "succeeded",
            AttemptStatus::Failed => "failed",
            AttemptStatus::AlreadyProcessed => "already_processed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AttemptStatus::Pending),
            "succeeded" => Some(AttemptStatus::Succeeded),
            "failed" => Some(AttemptStatus::Failed),
            "already_processed" => Some(AttemptStatus::AlreadyProcessed),
            _ => None,
        }
    }
}

/// Persisted record of one logical redemption attempt. Retries with
/// the same idempotency key replay the recorded response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionAttempt {
    pub idempotency_key: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub status: AttemptStatus,
    pub amount: i64,
    /// Wallet balance after the commit, recorded so a replay can return
    /// the identical response.
    pub new_balance: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_wallet_has_zero_balances() {
        let wallet = WalletLedger::empty("u1");
        assert_eq!(wallet.balance, 0);
        assert_eq!(wallet.total_earned, 0);
        assert_eq!(wallet.total_redeemed, 0);
    }

    #[test]
    fn transaction_kind_round_trips() {
        for kind in [TransactionKind::Redemption, TransactionKind::StreakBonus] {
            assert_eq!(TransactionKind::parse(kind.as_str()), Some(kind));
        }
        assert!(TransactionKind::parse("spend").is_none());
    }

    #[test]
    fn attempt_status_round_trips() {
        for status in [
            AttemptStatus::Pending,
            AttemptStatus::Succeeded,
            AttemptStatus::Failed,
            AttemptStatus::AlreadyProcessed,
        ] {
            assert_eq!(AttemptStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn transactions_get_unique_ids() {
        let a = Transaction::new("u1", TransactionKind::Redemption, 100, "day");
        let b = Transaction::new("u1", TransactionKind::Redemption, 100, "day");
        assert_ne!(a.id, b.id);
    }
}
