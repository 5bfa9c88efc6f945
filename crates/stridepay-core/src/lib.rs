//! # StridePay Core Library
//!
//! This library converts daily step counts into a monetary-equivalent
//! ledger balance. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any GUI
//! or service layer being a thin shell over the same core library.
//!
//! ## Architecture
//!
//! - **Rate Engine**: pure conversion of step counts into pending
//!   currency units under the tier schedule and bonus stacking
//! - **Tier Progression / Streak Tracker**: per-user state machines
//!   advanced by caller-driven step recording
//! - **Redemption Engine**: atomic, idempotent, rate-limited commit of
//!   one day's pending units into the durable wallet
//! - **Storage**: SQLite-based wallet/earnings store and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`RewardEngine`]: facade wiring the calculators to the store
//! - [`TierTable`]: the static earning-rate schedule
//! - [`Database`]: wallet and earnings persistence
//! - [`Config`]: application configuration management

pub mod bonus;
pub mod engine;
pub mod error;
pub mod events;
pub mod progression;
pub mod rate;
pub mod redemption;
pub mod storage;
pub mod streak;
pub mod tiers;
pub mod wallet;

pub use engine::{RedemptionReport, RewardEngine, StepsReport};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use progression::{CarryPolicy, TierProgress};
pub use redemption::{RateLimitPolicy, RedemptionOutcome, RedemptionStatus};
pub use storage::{Config, Database};
pub use streak::{StreakConfig, StreakState};
pub use tiers::{TierDefinition, TierTable, STEPS_PER_BLOCK};
pub use wallet::{DailyEarningRecord, Transaction, TransactionKind, WalletLedger};
