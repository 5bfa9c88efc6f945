//! The reward engine facade.
//!
//! `RewardEngine` wires the pure calculators to the SQLite store and
//! enforces the concurrency discipline: per-user serialization for
//! step recording, a per-(user, date) in-flight guard plus an atomic
//! commit for redemption. All engine operations are caller-driven;
//! there are no background timers in here -- simulated or live step
//! feeds are external callers of [`RewardEngine::record_steps`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::bonus::{combined_factor, BonusBreakdown, BonusContext};
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::progression::TierProgress;
use crate::rate::{effective_rate, pending_units};
use crate::redemption::{RedemptionOutcome, RedemptionStatus};
use crate::storage::{Config, Database};
use crate::streak::StreakState;
use crate::tiers::TierTable;
use crate::wallet::{AttemptStatus, RedemptionAttempt, Transaction, TransactionKind};

/// Result of recording one day's cumulative steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepsReport {
    pub user_id: String,
    pub date: NaiveDate,
    pub steps: u64,
    pub tier_ordinal: u32,
    pub tier_label: String,
    pub effective_rate: f64,
    pub bonus: BonusBreakdown,
    pub pending_units: i64,
    pub streak_days: u32,
    pub events: Vec<Event>,
}

/// Result of a redemption call: the caller-facing outcome plus any
/// events for the notification layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionReport {
    pub outcome: RedemptionOutcome,
    pub events: Vec<Event>,
}

/// Removes its (user, date) entry from the in-flight set on drop, so
/// the guard is released on every exit path including errors.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<(String, NaiveDate)>>>,
    key: (String, NaiveDate),
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.key);
        }
    }
}

/// Engine facade over the wallet store and the pure calculators.
pub struct RewardEngine {
    db: Mutex<Database>,
    tiers: TierTable,
    config: Config,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    in_flight: Arc<Mutex<HashSet<(String, NaiveDate)>>>,
}

impl RewardEngine {
    pub fn new(db: Database, config: Config, tiers: TierTable) -> Self {
        Self {
            db: Mutex::new(db),
            tiers,
            config,
            user_locks: Mutex::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Open the engine over the default database and configuration.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open()?;
        let config = Config::load_or_default();
        Ok(Self::new(db, config, TierTable::default()))
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().expect("user lock registry poisoned");
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn validate_user(user_id: &str) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::EmptyUserId.into());
        }
        Ok(())
    }

    // ── Step recording ───────────────────────────────────────────────

    /// Record the cumulative step count for one user and date.
    ///
    /// Callable any number of times per day: `pending_units` is
    /// recomputed from the latest cumulative `steps` value, never
    /// accumulated. Updates per user are serialized; the step delta
    /// since the previous call feeds tier progression, and the streak
    /// is evaluated at most once per qualifying date.
    pub fn record_steps(&self, user_id: &str, date: NaiveDate, steps: u64) -> Result<StepsReport> {
        Self::validate_user(user_id)?;
        // One day of slack for feeds reporting across timezone lines.
        if date > Utc::now().date_naive() + chrono::Duration::days(1) {
            return Err(ValidationError::FutureDate { date }.into());
        }

        let lock = self.user_lock(user_id);
        let _user_guard = lock.lock().expect("user lock poisoned");
        let db = self.db.lock().expect("database lock poisoned");

        let previous = db.daily_record(user_id, date)?;
        if previous.as_ref().is_some_and(|r| r.is_redeemed) {
            return Err(ValidationError::DateAlreadyRedeemed { date }.into());
        }
        let previous_steps = previous.map(|r| r.steps).unwrap_or(0);

        db.ensure_wallet(user_id)?;

        let mut progress = db
            .tier_progress(user_id)?
            .unwrap_or_else(|| TierProgress::new(user_id));
        let delta = steps.saturating_sub(previous_steps);
        let mut events =
            progress.apply_steps(&self.tiers, delta, self.config.progression.carry_policy);

        let mut streak = db
            .streak_state(user_id)?
            .unwrap_or_else(|| StreakState::new(user_id));
        let outcome = streak.evaluate(date, steps, &self.config.streak);
        if outcome.qualified {
            events.push(Event::StreakExtended {
                days: outcome.days_for_rate,
                at: Utc::now(),
            });
        }
        if let Some(bonus_amount) = outcome.milestone_bonus {
            events.push(Event::StreakMilestone {
                days: outcome.days_for_rate,
                bonus_amount,
                at: Utc::now(),
            });
        }

        let tier = self
            .tiers
            .get(progress.tier_ordinal)
            .ok_or_else(|| CoreError::Custom(format!("no tier {}", progress.tier_ordinal)))?;

        let bonus = combined_factor(&BonusContext {
            date,
            streak_days: outcome.days_for_rate,
            tier_ordinal: progress.tier_ordinal,
            tier_completion: progress.completion(&self.tiers),
        });
        let rate = effective_rate(tier.base_rate, bonus.factor);
        let pending = pending_units(steps, rate);

        let record = crate::wallet::DailyEarningRecord {
            user_id: user_id.to_string(),
            date,
            steps,
            pending_units: pending,
            is_redeemed: false,
        };
        let bonus_tx = outcome.milestone_bonus.map(|amount| {
            Transaction::new(
                user_id,
                TransactionKind::StreakBonus,
                amount,
                format!("{}-day streak bonus", self.config.streak.milestone_days),
            )
        });
        db.commit_steps(&record, &progress, &streak, bonus_tx.as_ref())?;

        Ok(StepsReport {
            user_id: user_id.to_string(),
            date,
            steps,
            tier_ordinal: tier.ordinal,
            tier_label: tier.label.clone(),
            effective_rate: rate,
            bonus,
            pending_units: pending,
            streak_days: outcome.days_for_rate,
            events,
        })
    }

    // ── Redemption ───────────────────────────────────────────────────

    /// Commit one day's pending units into the wallet, exactly once.
    ///
    /// State machine: requested -> {already_processed | rate_limited |
    /// concurrent | no_record | succeeded | failed}. Retries with the
    /// same idempotency key replay the original response.
    pub fn redeem(
        &self,
        user_id: &str,
        date: NaiveDate,
        idempotency_key: &str,
    ) -> Result<RedemptionReport> {
        Self::validate_user(user_id)?;
        if idempotency_key.trim().is_empty() {
            return Err(ValidationError::EmptyIdempotencyKey.into());
        }

        // 1. Attempt bookkeeping: rate limit over the trailing window,
        //    then idempotent replay for a key that already settled. The
        //    store lock is released before the in-flight guard so this
        //    phase never waits behind another commit.
        {
            let db = self.db.lock().expect("database lock poisoned");

            let cutoff = self.config.rate_limit.window_start(Utc::now());
            let recent = db.attempts_since(user_id, cutoff)?;
            if !self.config.rate_limit.allows(recent) {
                return Ok(RedemptionReport {
                    outcome: RedemptionOutcome::bare(RedemptionStatus::RateLimited),
                    events: Vec::new(),
                });
            }

            if let Some(existing) = db.attempt(idempotency_key)? {
                // A key names one logical action. Replaying under a
                // different user or date would leak the original figures.
                if existing.user_id != user_id || existing.date != date {
                    return Err(ValidationError::IdempotencyKeyMismatch {
                        key: idempotency_key.to_string(),
                    }
                    .into());
                }
                match existing.status {
                    AttemptStatus::Succeeded | AttemptStatus::AlreadyProcessed => {
                        return Ok(RedemptionReport {
                            outcome: RedemptionOutcome::settled(
                                RedemptionStatus::AlreadyProcessed,
                                existing.amount,
                                existing.new_balance,
                            ),
                            events: Vec::new(),
                        });
                    }
                    AttemptStatus::Pending => {
                        // Unsettled and older than the window: an orphan
                        // from a crashed process, not a live commit.
                        // Reopen it so the retry can proceed.
                        if existing.created_at < cutoff {
                            db.reopen_attempt(idempotency_key)?;
                        } else {
                            return Ok(RedemptionReport {
                                outcome: RedemptionOutcome::bare(RedemptionStatus::Concurrent),
                                events: Vec::new(),
                            });
                        }
                    }
                    // A failed attempt may be retried with the same key.
                    AttemptStatus::Failed => {
                        db.reopen_attempt(idempotency_key)?;
                    }
                }
            } else {
                db.insert_attempt(&RedemptionAttempt {
                    idempotency_key: idempotency_key.to_string(),
                    user_id: user_id.to_string(),
                    date,
                    status: AttemptStatus::Pending,
                    amount: 0,
                    new_balance: 0,
                    created_at: Utc::now(),
                })?;
            }
        }

        // 2. Per-(user, date) in-flight guard: fail fast, never queue.
        let flight_key = (user_id.to_string(), date);
        let inserted = {
            let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
            in_flight.insert(flight_key.clone())
        };
        if !inserted {
            let db = self.db.lock().expect("database lock poisoned");
            db.mark_attempt(idempotency_key, AttemptStatus::Failed, 0, 0)?;
            return Ok(RedemptionReport {
                outcome: RedemptionOutcome::bare(RedemptionStatus::Concurrent),
                events: Vec::new(),
            });
        }
        let _flight_guard = InFlightGuard {
            set: Arc::clone(&self.in_flight),
            key: flight_key,
        };

        // 3. Settle under the guard. The record is read here, not in
        //    phase 1, because another call may have redeemed the day in
        //    between.
        let db = self.db.lock().expect("database lock poisoned");

        let Some(record) = db.daily_record(user_id, date)? else {
            db.mark_attempt(idempotency_key, AttemptStatus::Failed, 0, 0)?;
            return Ok(RedemptionReport {
                outcome: RedemptionOutcome::bare(RedemptionStatus::NoRecord),
                events: Vec::new(),
            });
        };

        if record.is_redeemed {
            let balance = db.wallet_or_create(user_id)?.balance;
            db.mark_attempt(
                idempotency_key,
                AttemptStatus::AlreadyProcessed,
                record.pending_units,
                balance,
            )?;
            return Ok(RedemptionReport {
                outcome: RedemptionOutcome::settled(
                    RedemptionStatus::AlreadyProcessed,
                    record.pending_units,
                    balance,
                ),
                events: Vec::new(),
            });
        }

        db.ensure_wallet(user_id)?;

        // Atomic commit. A storage fault rolls everything back.
        let amount = record.pending_units;
        match db.commit_redemption(user_id, date, idempotency_key, amount) {
            Ok(new_balance) => Ok(RedemptionReport {
                outcome: RedemptionOutcome::settled(
                    RedemptionStatus::Succeeded,
                    amount,
                    new_balance,
                ),
                events: vec![Event::RedemptionSucceeded {
                    date,
                    amount,
                    new_balance,
                    at: Utc::now(),
                }],
            }),
            Err(_) => {
                db.mark_attempt(idempotency_key, AttemptStatus::Failed, 0, 0)?;
                Ok(RedemptionReport {
                    outcome: RedemptionOutcome::bare(RedemptionStatus::Failed),
                    events: Vec::new(),
                })
            }
        }
    }

    // ── Read side ────────────────────────────────────────────────────

    pub fn wallet(&self, user_id: &str) -> Result<crate::wallet::WalletLedger> {
        Self::validate_user(user_id)?;
        let db = self.db.lock().expect("database lock poisoned");
        Ok(db.wallet_or_create(user_id)?)
    }

    pub fn streak(&self, user_id: &str) -> Result<StreakState> {
        Self::validate_user(user_id)?;
        let db = self.db.lock().expect("database lock poisoned");
        Ok(db
            .streak_state(user_id)?
            .unwrap_or_else(|| StreakState::new(user_id)))
    }

    pub fn tier_progress(&self, user_id: &str) -> Result<TierProgress> {
        Self::validate_user(user_id)?;
        let db = self.db.lock().expect("database lock poisoned");
        Ok(db
            .tier_progress(user_id)?
            .unwrap_or_else(|| TierProgress::new(user_id)))
    }

    pub fn daily_record(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<crate::wallet::DailyEarningRecord>> {
        Self::validate_user(user_id)?;
        let db = self.db.lock().expect("database lock poisoned");
        Ok(db.daily_record(user_id, date)?)
    }

    pub fn transactions(&self, user_id: &str, limit: u32) -> Result<Vec<Transaction>> {
        Self::validate_user(user_id)?;
        let db = self.db.lock().expect("database lock poisoned");
        Ok(db.transactions(user_id, limit)?)
    }
}
