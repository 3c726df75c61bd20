// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push queue storage.
//!
//! Claims are a single `UPDATE ... RETURNING` so concurrent runners never
//! lease the same row.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::{format_timestamp, parse_db, parse_timestamp, Database};
use crate::error::{Error, Result};
use crate::push::QueueItem;
use crate::trigger::LocalOp;

const COLUMNS: &str =
    "item_id, mapping_id, entity_id, op, payload, fail_count, revision, expire, created, updated";

/// Map a row to a QueueItem.
///
/// Expected columns: see [`COLUMNS`].
fn row_to_queue_item(row: &rusqlite::Row) -> rusqlite::Result<QueueItem> {
    let op: String = row.get(3)?;
    let payload: Option<String> = row.get(4)?;
    let created: String = row.get(8)?;
    let updated: String = row.get(9)?;
    let payload = payload
        .map(|p| {
            serde_json::from_str::<Value>(&p).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(Error::CorruptedData(format!("invalid payload: {e}"))),
                )
            })
        })
        .transpose()?;
    Ok(QueueItem {
        item_id: row.get(0)?,
        mapping_id: row.get(1)?,
        entity_id: row.get(2)?,
        op: parse_db::<LocalOp>(&op, "op")?,
        payload,
        fail_count: row.get(5)?,
        revision: row.get(6)?,
        expire: row.get(7)?,
        created: parse_timestamp(&created, "created")?,
        updated: parse_timestamp(&updated, "updated")?,
    })
}

impl Database {
    /// Insert an item, or merge into the pending item for the same
    /// `(mapping_id, entity_id)`: the newer op and payload win and the
    /// revision is bumped. Returns the item id.
    pub fn upsert_queue_item(
        &self,
        mapping_id: &str,
        entity_id: &str,
        op: LocalOp,
        payload: Option<&Value>,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let payload = payload.map(serde_json::to_string).transpose()?;
        let now = format_timestamp(now);
        let item_id = self.conn.query_row(
            "INSERT INTO push_queue (mapping_id, entity_id, op, payload, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT (mapping_id, entity_id) DO UPDATE SET
                 op = excluded.op,
                 payload = excluded.payload,
                 updated = excluded.updated,
                 revision = push_queue.revision + 1
             RETURNING item_id",
            params![mapping_id, entity_id, op.as_str(), payload, now],
            |row| row.get(0),
        )?;
        Ok(item_id)
    }

    /// Atomically lease up to `limit` unclaimed or expired items.
    ///
    /// `mapping_id` restricts the claim to one mapping. Items are returned
    /// oldest first.
    pub fn claim_queue_items(
        &self,
        mapping_id: Option<&str>,
        limit: usize,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<QueueItem>> {
        let sql = format!(
            "UPDATE push_queue SET expire = ?1
             WHERE item_id IN (
                 SELECT item_id FROM push_queue
                 WHERE (expire = 0 OR expire <= ?2)
                   AND (?3 IS NULL OR mapping_id = ?3)
                 ORDER BY updated, item_id
                 LIMIT ?4
             )
             RETURNING {COLUMNS}"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut items = stmt
            .query_map(
                params![lease_until.timestamp(), now.timestamp(), mapping_id, limit],
                row_to_queue_item,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        items.sort_by(|a, b| a.updated.cmp(&b.updated).then(a.item_id.cmp(&b.item_id)));
        Ok(items)
    }

    /// Get a queue item by ID.
    pub fn get_queue_item(&self, item_id: i64) -> Result<Option<QueueItem>> {
        let sql = format!("SELECT {COLUMNS} FROM push_queue WHERE item_id = ?1");
        Ok(self.conn.query_row(&sql, [item_id], row_to_queue_item).optional()?)
    }

    /// Delete an item only if it has not been merged since it was claimed.
    pub fn delete_queue_item(&self, item_id: i64, revision: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM push_queue WHERE item_id = ?1 AND revision = ?2",
            params![item_id, revision],
        )?;
        Ok(changed > 0)
    }

    /// Delete an item regardless of revision.
    pub fn remove_queue_item(&self, item_id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM push_queue WHERE item_id = ?1", [item_id])?;
        Ok(changed > 0)
    }

    /// Clear the lease on the given items.
    pub fn release_queue_items(&self, item_ids: &[i64]) -> Result<usize> {
        let mut stmt = self.conn.prepare("UPDATE push_queue SET expire = 0 WHERE item_id = ?1")?;
        let mut released = 0;
        for item_id in item_ids {
            released += stmt.execute([item_id])?;
        }
        Ok(released)
    }

    /// Record a failure: bump the fail count and clear the lease.
    ///
    /// Returns the new fail count, or `None` if the item no longer exists.
    pub fn fail_queue_item(&self, item_id: i64, now: DateTime<Utc>) -> Result<Option<u32>> {
        let fail_count = self
            .conn
            .query_row(
                "UPDATE push_queue SET fail_count = fail_count + 1, expire = 0, updated = ?1
                 WHERE item_id = ?2
                 RETURNING fail_count",
                params![format_timestamp(now), item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(fail_count)
    }

    /// Clear leases that expired before `now`. Returns how many were cleared.
    pub fn release_expired_queue_items(&self, now: DateTime<Utc>) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE push_queue SET expire = 0 WHERE expire != 0 AND expire <= ?1",
            [now.timestamp()],
        )?;
        Ok(changed)
    }

    /// List items, optionally for one mapping, oldest first.
    pub fn list_queue_items(&self, mapping_id: Option<&str>) -> Result<Vec<QueueItem>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM push_queue
             WHERE ?1 IS NULL OR mapping_id = ?1
             ORDER BY updated, item_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map([mapping_id], row_to_queue_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn count_queue_items(&self, mapping_id: Option<&str>) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM push_queue WHERE ?1 IS NULL OR mapping_id = ?1",
            [mapping_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete every item, optionally for one mapping.
    pub fn purge_queue(&self, mapping_id: Option<&str>) -> Result<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM push_queue WHERE ?1 IS NULL OR mapping_id = ?1", [mapping_id])?;
        Ok(changed)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
