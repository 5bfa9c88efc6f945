//! Database schema migrations for stridepay.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration
//! version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current
/// schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: initial schema.
///
/// Wallets, per-date earnings, tier/streak state, the append-only
/// transaction log, and the redemption attempt log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS wallets (
            user_id        TEXT PRIMARY KEY,
            balance        INTEGER NOT NULL DEFAULT 0,
            total_earned   INTEGER NOT NULL DEFAULT 0,
            total_redeemed INTEGER NOT NULL DEFAULT 0,
            last_updated   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_earnings (
            user_id       TEXT NOT NULL,
            date          TEXT NOT NULL,
            steps         INTEGER NOT NULL DEFAULT 0,
            pending_units INTEGER NOT NULL DEFAULT 0,
            is_redeemed   INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, date)
        );

        CREATE TABLE IF NOT EXISTS tier_progress (
            user_id       TEXT PRIMARY KEY,
            tier_ordinal  INTEGER NOT NULL DEFAULT 1,
            steps_in_tier INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS streak_state (
            user_id              TEXT PRIMARY KEY,
            current_days         INTEGER NOT NULL DEFAULT 0,
            longest_days         INTEGER NOT NULL DEFAULT 0,
            last_qualifying_date TEXT,
            bonus_awarded        INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            kind        TEXT NOT NULL,
            amount      INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS redemption_attempts (
            idempotency_key TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL,
            date            TEXT NOT NULL,
            status          TEXT NOT NULL,
            amount          INTEGER NOT NULL DEFAULT 0,
            new_balance     INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_user_created
            ON transactions(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_attempts_user_created
            ON redemption_attempts(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_earnings_user_redeemed
            ON daily_earnings(user_id, is_redeemed);",
    )?;

    set_schema_version(&tx, 1)?;

    tx.commit()?;
    Ok(())
}
