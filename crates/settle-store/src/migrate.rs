use crate::error::{Result, StoreError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::debug;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "001_init",
    sql: include_str!("../migrations/001_init.sql"),
}];

/// Applies every pending migration in one immediate transaction and records
/// each one in `settle_schema`.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS settle_schema (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let current = current_version(&tx)?;
    let latest = MIGRATIONS.last().map(|m| m.version).unwrap_or(0);
    if current > latest {
        return Err(StoreError::Migration(format!(
            "db version {} newer than available migrations {}",
            current, latest
        )));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        debug!(
            migration = migration.name,
            version = migration.version,
            "applying migration"
        );
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO settle_schema (version, name, applied_at) VALUES (?1, ?2, ?3);",
            params![migration.version, migration.name, Utc::now().timestamp()],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Highest applied migration, or 0 for a database never migrated.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let table: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'settle_schema';",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match table {
        Some(_) => current_version(conn),
        None => Ok(0),
    }
}

fn current_version(conn: &Connection) -> Result<i64> {
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM settle_schema;", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}
