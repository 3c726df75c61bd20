// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed storage for sync state.
//!
//! The [`Database`] struct holds the three pieces of shared mutable state:
//! mapped objects, the push queue, and a small key-value table for
//! checkpoints and last-run times.

mod mapped_objects;
mod queue;
mod state;

pub use state::keys;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;

use crate::error::{Error, Result};

/// SQL schema for the sync database.
pub const SCHEMA: &str = r#"
-- Links between local entities and remote records
CREATE TABLE IF NOT EXISTS mapped_objects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type_id TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    salesforce_id TEXT NOT NULL,
    salesforce_mapping TEXT NOT NULL,
    entity_updated TEXT,
    last_sync TEXT,
    last_sync_action TEXT NOT NULL,
    last_sync_status INTEGER NOT NULL DEFAULT 1,
    revision_log_message TEXT,
    force_pull INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE (salesforce_id, salesforce_mapping)
);

-- Pending local changes, one per (mapping, entity)
CREATE TABLE IF NOT EXISTS push_queue (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    mapping_id TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    op TEXT NOT NULL,
    payload TEXT,
    fail_count INTEGER NOT NULL DEFAULT 0,
    revision INTEGER NOT NULL DEFAULT 0,
    expire INTEGER NOT NULL DEFAULT 0,
    created TEXT NOT NULL,
    updated TEXT NOT NULL,
    UNIQUE (mapping_id, entity_id)
);

-- Checkpoints and last-run times
CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_mapped_objects_entity
    ON mapped_objects(entity_type_id, entity_id);
CREATE INDEX IF NOT EXISTS idx_mapped_objects_salesforce_id ON mapped_objects(salesforce_id);
CREATE INDEX IF NOT EXISTS idx_push_queue_claim ON push_queue(mapping_id, expire);
"#;

/// Format a timestamp for storage.
///
/// Fixed-width UTC so stored values sort lexicographically.
pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored value with [`FromStr`](std::str::FromStr).
pub(crate) fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
pub(crate) fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse an optional RFC3339 timestamp from the database.
pub(crate) fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    value.map(|s| parse_timestamp(&s, column)).transpose()
}

/// Whether `err` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Create the schema on a database connection if it is not there yet.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// SQLite database connection with sync state operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL plus a busy timeout lets scheduled and standalone runners share the file
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
