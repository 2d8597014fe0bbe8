//! Forward-only schema migrations for the reference tables and the cache.
//!
//! `_migrations` records every applied step by number and name. Each step
//! runs in its own transaction together with its bookkeeping row.

use crate::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "reference", sql: include_str!("../../migrations/001_reference.sql") },
    Migration { version: 2, name: "cache", sql: include_str!("../../migrations/002_cache.sql") },
];

/// Apply every step newer than the database's recorded version.
///
/// A database recorded at a version this build does not know is refused
/// rather than used with a schema it may not match.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
        let latest = MIGRATIONS.last().map_or(0, |m| m.version);
        if current > latest {
            return Err(Error::MigrationFailed(format!(
                "database schema version {current} is newer than this build ({latest})"
            )));
        }

        for step in MIGRATIONS.iter().filter(|m| m.version > current) {
            apply(conn, step).map_err(|e| Error::MigrationFailed(format!("{} {}: {e}", step.version, step.name)))?;
            tracing::info!(version = step.version, name = step.name, "applied migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn apply(conn: &mut rusqlite::Connection, step: &Migration) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)?;
    tx.execute(
        "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![step.version, step.name, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()
}
