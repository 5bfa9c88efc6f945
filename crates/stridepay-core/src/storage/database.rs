//! SQLite-backed wallet and earnings storage.
//!
//! Provides persistent storage for:
//! - Per-user wallets and the append-only transaction log
//! - Per-date daily earning records
//! - Tier progression and streak state
//! - Redemption attempts (idempotency + rate limiting)
//!
//! The two multi-write operations, [`Database::commit_steps`] and
//! [`Database::commit_redemption`], run inside a single SQLite
//! transaction: either every write lands or none does.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::DatabaseError;
use crate::progression::TierProgress;
use crate::streak::StreakState;
use crate::wallet::{
    AttemptStatus, DailyEarningRecord, RedemptionAttempt, Transaction, TransactionKind,
    WalletLedger,
};

const DATE_FMT: &str = "%Y-%m-%d";

fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| DatabaseError::QueryFailed(format!("bad date '{s}': {e}")))
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{s}': {e}")))
}

/// SQLite database for wallet, earnings and redemption state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/stridepay/stridepay.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("stridepay.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (and migrate) a database at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        super::migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Wallets ──────────────────────────────────────────────────────

    /// Create the wallet row with zero balances if it doesn't exist.
    pub fn ensure_wallet(&self, user_id: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO wallets (user_id, balance, total_earned, total_redeemed, last_updated)
             VALUES (?1, 0, 0, 0, ?2)",
            params![user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn wallet(&self, user_id: &str) -> Result<Option<WalletLedger>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT balance, total_earned, total_redeemed, last_updated
                 FROM wallets WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((balance, total_earned, total_redeemed, last_updated)) => Ok(Some(WalletLedger {
                user_id: user_id.to_string(),
                balance,
                total_earned,
                total_redeemed,
                last_updated: parse_ts(&last_updated)?,
            })),
        }
    }

    /// The wallet for a user, lazily created with zero balances.
    pub fn wallet_or_create(&self, user_id: &str) -> Result<WalletLedger, DatabaseError> {
        self.ensure_wallet(user_id)?;
        self.wallet(user_id)?
            .ok_or_else(|| DatabaseError::QueryFailed("wallet row vanished".to_string()))
    }

    // ── Tier progress ────────────────────────────────────────────────

    pub fn tier_progress(&self, user_id: &str) -> Result<Option<TierProgress>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT tier_ordinal, steps_in_tier FROM tier_progress WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u64>(1)?)),
            )
            .optional()?;
        Ok(row.map(|(tier_ordinal, steps_in_tier)| TierProgress {
            user_id: user_id.to_string(),
            tier_ordinal,
            steps_in_tier,
        }))
    }

    pub fn upsert_tier_progress(&self, progress: &TierProgress) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO tier_progress (user_id, tier_ordinal, steps_in_tier)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                tier_ordinal = excluded.tier_ordinal,
                steps_in_tier = excluded.steps_in_tier",
            params![progress.user_id, progress.tier_ordinal, progress.steps_in_tier],
        )?;
        Ok(())
    }

    // ── Streak state ─────────────────────────────────────────────────

    pub fn streak_state(&self, user_id: &str) -> Result<Option<StreakState>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT current_days, longest_days, last_qualifying_date, bonus_awarded
                 FROM streak_state WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((current_days, longest_days, last_date, bonus_awarded)) => {
                let last_qualifying_date = match last_date {
                    Some(s) => Some(parse_date(&s)?),
                    None => None,
                };
                Ok(Some(StreakState {
                    user_id: user_id.to_string(),
                    current_days,
                    longest_days,
                    last_qualifying_date,
                    bonus_awarded_for_cycle: bonus_awarded,
                }))
            }
        }
    }

    pub fn upsert_streak_state(&self, streak: &StreakState) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO streak_state
                (user_id, current_days, longest_days, last_qualifying_date, bonus_awarded)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                current_days = excluded.current_days,
                longest_days = excluded.longest_days,
                last_qualifying_date = excluded.last_qualifying_date,
                bonus_awarded = excluded.bonus_awarded",
            params![
                streak.user_id,
                streak.current_days,
                streak.longest_days,
                streak
                    .last_qualifying_date
                    .map(|d| d.format(DATE_FMT).to_string()),
                streak.bonus_awarded_for_cycle,
            ],
        )?;
        Ok(())
    }

    // ── Daily earnings ───────────────────────────────────────────────

    pub fn daily_record(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyEarningRecord>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT steps, pending_units, is_redeemed
                 FROM daily_earnings WHERE user_id = ?1 AND date = ?2",
                params![user_id, date.format(DATE_FMT).to_string()],
                |row| {
                    Ok((
                        row.get::<_, u64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.map(|(steps, pending_units, is_redeemed)| DailyEarningRecord {
            user_id: user_id.to_string(),
            date,
            steps,
            pending_units,
            is_redeemed,
        }))
    }

    // ── Transactions ─────────────────────────────────────────────────

    /// Most recent transactions for a user, newest first.
    pub fn transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Transaction>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, amount, description, created_at
             FROM transactions WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, kind, amount, description, created_at) = row?;
            let kind = TransactionKind::parse(&kind)
                .ok_or_else(|| DatabaseError::QueryFailed(format!("unknown kind '{kind}'")))?;
            out.push(Transaction {
                id,
                user_id: user_id.to_string(),
                kind,
                amount,
                description,
                created_at: parse_ts(&created_at)?,
            });
        }
        Ok(out)
    }

    // ── Redemption attempts ──────────────────────────────────────────

    pub fn attempt(&self, idempotency_key: &str) -> Result<Option<RedemptionAttempt>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, date, status, amount, new_balance, created_at
                 FROM redemption_attempts WHERE idempotency_key = ?1",
                params![idempotency_key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((user_id, date, status, amount, new_balance, created_at)) => {
                let status = AttemptStatus::parse(&status)
                    .ok_or_else(|| DatabaseError::QueryFailed(format!("unknown status '{status}'")))?;
                Ok(Some(RedemptionAttempt {
                    idempotency_key: idempotency_key.to_string(),
                    user_id,
                    date: parse_date(&date)?,
                    status,
                    amount,
                    new_balance,
                    created_at: parse_ts(&created_at)?,
                }))
            }
        }
    }

    /// Record a fresh attempt in `pending` state.
    pub fn insert_attempt(&self, attempt: &RedemptionAttempt) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO redemption_attempts
                (idempotency_key, user_id, date, status, amount, new_balance, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                attempt.idempotency_key,
                attempt.user_id,
                attempt.date.format(DATE_FMT).to_string(),
                attempt.status.as_str(),
                attempt.amount,
                attempt.new_balance,
                attempt.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Reset an orphaned or failed attempt to `pending` with a fresh
    /// timestamp so a retry with the same key can proceed.
    pub fn reopen_attempt(&self, idempotency_key: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE redemption_attempts
             SET status = 'pending', amount = 0, new_balance = 0, created_at = ?2
             WHERE idempotency_key = ?1",
            params![idempotency_key, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Update the terminal status of an attempt outside a commit
    /// (rate-limited, no-record, failed, replayed).
    pub fn mark_attempt(
        &self,
        idempotency_key: &str,
        status: AttemptStatus,
        amount: i64,
        new_balance: i64,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE redemption_attempts
             SET status = ?2, amount = ?3, new_balance = ?4
             WHERE idempotency_key = ?1",
            params![idempotency_key, status.as_str(), amount, new_balance],
        )?;
        Ok(())
    }

    /// Attempts made by a user since `cutoff` (rate-limit input).
    pub fn attempts_since(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u32, DatabaseError> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM redemption_attempts
             WHERE user_id = ?1 AND created_at >= ?2",
            params![user_id, cutoff.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Atomic commits ───────────────────────────────────────────────

    /// Persist the outcome of one `record_steps` call in a single
    /// transaction: the recomputed daily record, the advanced tier
    /// progress, the streak state, and (if a streak milestone fired)
    /// the bonus credit plus its transaction record.
    pub fn commit_steps(
        &self,
        record: &DailyEarningRecord,
        progress: &TierProgress,
        streak: &StreakState,
        streak_bonus: Option<&Transaction>,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO daily_earnings (user_id, date, steps, pending_units, is_redeemed)
             VALUES (?1, ?2, ?3, ?4, 0)
             ON CONFLICT(user_id, date) DO UPDATE SET
                steps = excluded.steps,
                pending_units = excluded.pending_units
             WHERE is_redeemed = 0",
            params![
                record.user_id,
                record.date.format(DATE_FMT).to_string(),
                record.steps,
                record.pending_units,
            ],
        )?;

        tx.execute(
            "INSERT INTO tier_progress (user_id, tier_ordinal, steps_in_tier)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                tier_ordinal = excluded.tier_ordinal,
                steps_in_tier = excluded.steps_in_tier",
            params![progress.user_id, progress.tier_ordinal, progress.steps_in_tier],
        )?;

        tx.execute(
            "INSERT INTO streak_state
                (user_id, current_days, longest_days, last_qualifying_date, bonus_awarded)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                current_days = excluded.current_days,
                longest_days = excluded.longest_days,
                last_qualifying_date = excluded.last_qualifying_date,
                bonus_awarded = excluded.bonus_awarded",
            params![
                streak.user_id,
                streak.current_days,
                streak.longest_days,
                streak
                    .last_qualifying_date
                    .map(|d| d.format(DATE_FMT).to_string()),
                streak.bonus_awarded_for_cycle,
            ],
        )?;

        if let Some(bonus) = streak_bonus {
            let changed = tx.execute(
                "UPDATE wallets
                 SET balance = balance + ?2, total_earned = total_earned + ?2, last_updated = ?3
                 WHERE user_id = ?1",
                params![bonus.user_id, bonus.amount, Utc::now().to_rfc3339()],
            )?;
            if changed != 1 {
                return Err(DatabaseError::QueryFailed(format!(
                    "wallet missing for user '{}'",
                    bonus.user_id
                )));
            }
            tx.execute(
                "INSERT INTO transactions (id, user_id, kind, amount, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    bonus.id,
                    bonus.user_id,
                    bonus.kind.as_str(),
                    bonus.amount,
                    bonus.description,
                    bonus.created_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Commit one day's pending units into the wallet, atomically.
    ///
    /// In a single transaction: marks the daily record redeemed,
    /// increases balance and total_earned by the same amount, appends
    /// the transaction record, and settles the attempt row. Returns
    /// the new balance.
    ///
    /// The guarded UPDATE on `daily_earnings` is the linearization
    /// point: it only succeeds if the record is still unredeemed, so a
    /// racing commit for the same (user, date) rolls back whole.
    pub fn commit_redemption(
        &self,
        user_id: &str,
        date: NaiveDate,
        idempotency_key: &str,
        amount: i64,
    ) -> Result<i64, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let date_str = date.format(DATE_FMT).to_string();
        let now = Utc::now().to_rfc3339();

        let changed = tx.execute(
            "UPDATE daily_earnings SET is_redeemed = 1
             WHERE user_id = ?1 AND date = ?2 AND is_redeemed = 0",
            params![user_id, date_str],
        )?;
        if changed != 1 {
            return Err(DatabaseError::QueryFailed(format!(
                "earnings for {date_str} missing or already redeemed"
            )));
        }

        let changed = tx.execute(
            "UPDATE wallets
             SET balance = balance + ?2, total_earned = total_earned + ?2, last_updated = ?3
             WHERE user_id = ?1",
            params![user_id, amount, now],
        )?;
        if changed != 1 {
            return Err(DatabaseError::QueryFailed(format!(
                "wallet missing for user '{user_id}'"
            )));
        }

        let record = Transaction::new(
            user_id,
            TransactionKind::Redemption,
            amount,
            format!("Redeemed earnings for {date_str}"),
        );
        tx.execute(
            "INSERT INTO transactions (id, user_id, kind, amount, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.user_id,
                record.kind.as_str(),
                record.amount,
                record.description,
                record.created_at.to_rfc3339(),
            ],
        )?;

        let new_balance: i64 = tx.query_row(
            "SELECT balance FROM wallets WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "UPDATE redemption_attempts
             SET status = 'succeeded', amount = ?2, new_balance = ?3
             WHERE idempotency_key = ?1",
            params![idempotency_key, amount, new_balance],
        )?;

        tx.commit()?;
        Ok(new_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_day(db: &Database, user: &str, day: NaiveDate, steps: u64, pending: i64) {
        db.ensure_wallet(user).unwrap();
        let record = DailyEarningRecord {
            user_id: user.to_string(),
            date: day,
            steps,
            pending_units: pending,
            is_redeemed: false,
        };
        let progress = TierProgress::new(user);
        let streak = StreakState::new(user);
        db.commit_steps(&record, &progress, &streak, None).unwrap();
    }

    #[test]
    fn wallet_created_lazily_with_zeros() {
        let db = Database::open_memory().unwrap();
        assert!(db.wallet("u1").unwrap().is_none());
        let wallet = db.wallet_or_create("u1").unwrap();
        assert_eq!(wallet.balance, 0);
        assert_eq!(wallet.total_earned, 0);
    }

    #[test]
    fn commit_steps_round_trips_state() {
        let db = Database::open_memory().unwrap();
        seed_day(&db, "u1", date(2025, 4, 15), 10_000, 400);

        let record = db.daily_record("u1", date(2025, 4, 15)).unwrap().unwrap();
        assert_eq!(record.steps, 10_000);
        assert_eq!(record.pending_units, 400);
        assert!(!record.is_redeemed);

        let progress = db.tier_progress("u1").unwrap().unwrap();
        assert_eq!(progress.tier_ordinal, 1);
    }

    #[test]
    fn commit_steps_recomputes_not_accumulates() {
        let db = Database::open_memory().unwrap();
        seed_day(&db, "u1", date(2025, 4, 15), 10_000, 400);
        seed_day(&db, "u1", date(2025, 4, 15), 12_000, 480);

        let record = db.daily_record("u1", date(2025, 4, 15)).unwrap().unwrap();
        assert_eq!(record.steps, 12_000);
        assert_eq!(record.pending_units, 480);
    }

    #[test]
    fn redeemed_record_is_immutable() {
        let db = Database::open_memory().unwrap();
        let day = date(2025, 4, 15);
        seed_day(&db, "u1", day, 10_000, 400);
        let attempt = RedemptionAttempt {
            idempotency_key: "k1".to_string(),
            user_id: "u1".to_string(),
            date: day,
            status: AttemptStatus::Pending,
            amount: 0,
            new_balance: 0,
            created_at: Utc::now(),
        };
        db.insert_attempt(&attempt).unwrap();
        db.commit_redemption("u1", day, "k1", 400).unwrap();

        // Guarded upsert leaves the redeemed row untouched.
        seed_day(&db, "u1", day, 99_000, 9_999);
        let record = db.daily_record("u1", day).unwrap().unwrap();
        assert_eq!(record.steps, 10_000);
        assert!(record.is_redeemed);
    }

    #[test]
    fn commit_redemption_updates_everything_atomically() {
        let db = Database::open_memory().unwrap();
        let day = date(2025, 4, 15);
        seed_day(&db, "u1", day, 10_000, 400);

        let attempt = RedemptionAttempt {
            idempotency_key: "k1".to_string(),
            user_id: "u1".to_string(),
            date: day,
            status: AttemptStatus::Pending,
            amount: 0,
            new_balance: 0,
            created_at: Utc::now(),
        };
        db.insert_attempt(&attempt).unwrap();

        let balance = db.commit_redemption("u1", day, "k1", 400).unwrap();
        assert_eq!(balance, 400);

        let wallet = db.wallet("u1").unwrap().unwrap();
        assert_eq!(wallet.balance, 400);
        assert_eq!(wallet.total_earned, 400);

        let record = db.daily_record("u1", day).unwrap().unwrap();
        assert!(record.is_redeemed);

        let txs = db.transactions("u1", 10).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionKind::Redemption);
        assert_eq!(txs[0].amount, 400);

        let settled = db.attempt("k1").unwrap().unwrap();
        assert_eq!(settled.status, AttemptStatus::Succeeded);
        assert_eq!(settled.amount, 400);
        assert_eq!(settled.new_balance, 400);
    }

    #[test]
    fn second_commit_for_same_day_rolls_back() {
        let db = Database::open_memory().unwrap();
        let day = date(2025, 4, 15);
        seed_day(&db, "u1", day, 10_000, 400);
        let attempt = RedemptionAttempt {
            idempotency_key: "k1".to_string(),
            user_id: "u1".to_string(),
            date: day,
            status: AttemptStatus::Pending,
            amount: 0,
            new_balance: 0,
            created_at: Utc::now(),
        };
        db.insert_attempt(&attempt).unwrap();
        db.commit_redemption("u1", day, "k1", 400).unwrap();

        let err = db.commit_redemption("u1", day, "k2", 400);
        assert!(err.is_err());

        // Exactly one credit, exactly one transaction.
        let wallet = db.wallet("u1").unwrap().unwrap();
        assert_eq!(wallet.total_earned, 400);
        assert_eq!(db.transactions("u1", 10).unwrap().len(), 1);
    }

    #[test]
    fn streak_bonus_credits_wallet_with_transaction() {
        let db = Database::open_memory().unwrap();
        db.ensure_wallet("u1").unwrap();
        let record = DailyEarningRecord {
            user_id: "u1".to_string(),
            date: date(2025, 4, 7),
            steps: 6_000,
            pending_units: 240,
            is_redeemed: false,
        };
        let progress = TierProgress::new("u1");
        let streak = StreakState::new("u1");
        let bonus = Transaction::new("u1", TransactionKind::StreakBonus, 500, "7-day streak bonus");
        db.commit_steps(&record, &progress, &streak, Some(&bonus))
            .unwrap();

        let wallet = db.wallet("u1").unwrap().unwrap();
        assert_eq!(wallet.balance, 500);
        assert_eq!(wallet.total_earned, 500);
        let txs = db.transactions("u1", 10).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionKind::StreakBonus);
    }

    #[test]
    fn reopen_attempt_resets_status_and_timestamp() {
        let db = Database::open_memory().unwrap();
        let attempt = RedemptionAttempt {
            idempotency_key: "k1".to_string(),
            user_id: "u1".to_string(),
            date: date(2025, 4, 15),
            status: AttemptStatus::Failed,
            amount: 400,
            new_balance: 400,
            created_at: Utc::now() - Duration::hours(3),
        };
        db.insert_attempt(&attempt).unwrap();

        db.reopen_attempt("k1").unwrap();
        let reopened = db.attempt("k1").unwrap().unwrap();
        assert_eq!(reopened.status, AttemptStatus::Pending);
        assert_eq!(reopened.amount, 0);
        assert_eq!(reopened.new_balance, 0);
        assert!(reopened.created_at > Utc::now() - Duration::seconds(5));
    }

    #[test]
    fn attempts_since_counts_window_only() {
        let db = Database::open_memory().unwrap();
        let day = date(2025, 4, 15);
        for i in 0..3 {
            let attempt = RedemptionAttempt {
                idempotency_key: format!("k{i}"),
                user_id: "u1".to_string(),
                date: day,
                status: AttemptStatus::Pending,
                amount: 0,
                new_balance: 0,
                created_at: Utc::now(),
            };
            db.insert_attempt(&attempt).unwrap();
        }
        // One old attempt outside any reasonable window.
        let stale = RedemptionAttempt {
            idempotency_key: "old".to_string(),
            user_id: "u1".to_string(),
            date: day,
            status: AttemptStatus::Failed,
            amount: 0,
            new_balance: 0,
            created_at: Utc::now() - Duration::hours(2),
        };
        db.insert_attempt(&stale).unwrap();

        let count = db
            .attempts_since("u1", Utc::now() - Duration::seconds(60))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn open_at_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stridepay.db");
        {
            let db = Database::open_at(&path).unwrap();
            seed_day(&db, "u1", date(2025, 4, 15), 10_000, 400);
        }
        let db = Database::open_at(&path).unwrap();
        let record = db.daily_record("u1", date(2025, 4, 15)).unwrap().unwrap();
        assert_eq!(record.steps, 10_000);
        assert_eq!(record.pending_units, 400);
    }

    #[test]
    fn streak_state_round_trips_dates() {
        let db = Database::open_memory().unwrap();
        let mut streak = StreakState::new("u1");
        streak.current_days = 3;
        streak.longest_days = 5;
        streak.last_qualifying_date = Some(date(2025, 4, 14));
        db.upsert_streak_state(&streak).unwrap();

        let loaded = db.streak_state("u1").unwrap().unwrap();
        assert_eq!(loaded.current_days, 3);
        assert_eq!(loaded.longest_days, 5);
        assert_eq!(loaded.last_qualifying_date, Some(date(2025, 4, 14)));
        assert!(!loaded.bonus_awarded_for_cycle);
    }

    #[test]
    fn transactions_newest_first_with_limit() {
        let db = Database::open_memory().unwrap();
        db.ensure_wallet("u1").unwrap();
        for i in 0..5 {
            let mut tx = Transaction::new("u1", TransactionKind::Redemption, 100 + i, "day");
            tx.created_at = Utc::now() + Duration::seconds(i);
            db.conn
                .execute(
                    "INSERT INTO transactions (id, user_id, kind, amount, description, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        tx.id,
                        tx.user_id,
                        tx.kind.as_str(),
                        tx.amount,
                        tx.description,
                        tx.created_at.to_rfc3339(),
                    ],
                )
                .unwrap();
        }
        let txs = db.transactions("u1", 3).unwrap();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].amount, 104);
        assert_eq!(txs[2].amount, 102);
    }
}
