//! Schema migrations tracked by `PRAGMA user_version`.
//!
//! # Invariants
//! - Versions are strictly increasing; each SQL file is applied once.
//! - All pending migrations land in one IMMEDIATE transaction.
//! - A database newer than this binary is refused, never downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// `(version, sql)` in application order.
const MIGRATIONS: &[(u32, &str)] = &[
    (1, include_str!("0001_catalog.sql")),
    (2, include_str!("0002_accounts.sql")),
    (3, include_str!("0003_progress.sql")),
];

/// Highest schema version this binary understands.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to `latest_version()`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if checked_version(conn, latest)? == latest {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Another connection may have migrated while we waited for the lock.
    let from = checked_version(&tx, latest)?;
    for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > from) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_migrate module=db status=ok version={}", version);
    }
    tx.commit()?;
    Ok(())
}

fn checked_version(conn: &Connection, latest: u32) -> DbResult<u32> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: latest,
        });
    }
    Ok(version)
}
