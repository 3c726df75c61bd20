// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value state: checkpoints and last-run times.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{format_timestamp, parse_timestamp, Database};
use crate::error::{Error, Result};

/// State key builders.
pub mod keys {
    /// Last delete poll window end for a remote object type.
    pub fn delete_checkpoint(object_type: &str) -> String {
        format!("delete.last_delete_timestamp.{object_type}")
    }

    /// Newest pull trigger date processed for a mapping.
    pub fn pull_checkpoint(mapping_id: &str) -> String {
        format!("pull.last_pull_timestamp.{mapping_id}")
    }

    /// When a mapping's pull last ran.
    pub fn pull_last_run(mapping_id: &str) -> String {
        format!("pull.last_run.{mapping_id}")
    }

    /// When a mapping's push queue was last processed.
    pub fn push_last_run(mapping_id: &str) -> String {
        format!("push.last_run.{mapping_id}")
    }
}

impl Database {
    pub fn get_state(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM sync_state WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_state(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sync_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, format_timestamp(Utc::now())],
        )?;
        Ok(())
    }

    /// Remove a key. Returns false if it was not set.
    pub fn delete_state(&self, key: &str) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM sync_state WHERE key = ?1", [key])?;
        Ok(changed > 0)
    }

    /// All state entries, sorted by key.
    pub fn list_state(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM sync_state ORDER BY key")?;
        let entries = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn get_state_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        self.get_state(key)?
            .map(|value| {
                parse_timestamp(&value, key).map_err(|_| {
                    Error::CorruptedData(format!("invalid timestamp '{value}' for state '{key}'"))
                })
            })
            .transpose()
    }

    pub fn set_state_timestamp(&self, key: &str, value: DateTime<Utc>) -> Result<()> {
        self.set_state(key, &format_timestamp(value))
    }

    /// Move a timestamp checkpoint forward to `value`.
    ///
    /// The compare and write happen in one statement; a checkpoint never
    /// moves backwards even when runners overlap. Returns false if the stored
    /// value was already at or past `value`.
    pub fn advance_state_timestamp(&self, key: &str, value: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT INTO sync_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
             WHERE excluded.value > sync_state.value",
            params![key, format_timestamp(value), format_timestamp(Utc::now())],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
