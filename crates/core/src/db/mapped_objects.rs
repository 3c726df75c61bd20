// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mapped object storage.

use rusqlite::{params, OptionalExtension};

use super::{format_timestamp, is_unique_violation, parse_db, parse_timestamp, parse_timestamp_opt, Database};
use crate::error::{Error, Result};
use crate::mapped_object::MappedObject;
use crate::record::RemoteId;

const COLUMNS: &str = "id, entity_type_id, entity_id, salesforce_id, salesforce_mapping,
    entity_updated, last_sync, last_sync_action, last_sync_status, revision_log_message,
    force_pull, created_at";

/// Map a row to a MappedObject.
///
/// Expected columns: see [`COLUMNS`].
fn row_to_mapped_object(row: &rusqlite::Row) -> rusqlite::Result<MappedObject> {
    let salesforce_id: String = row.get(3)?;
    let action: String = row.get(7)?;
    let created_at: String = row.get(11)?;
    Ok(MappedObject {
        id: row.get(0)?,
        entity_type_id: row.get(1)?,
        entity_id: row.get(2)?,
        salesforce_id: parse_db::<RemoteId>(&salesforce_id, "salesforce_id")?,
        salesforce_mapping: row.get(4)?,
        entity_updated: parse_timestamp_opt(row.get(5)?, "entity_updated")?,
        last_sync: parse_timestamp_opt(row.get(6)?, "last_sync")?,
        last_sync_action: parse_db(&action, "last_sync_action")?,
        last_sync_status: row.get(8)?,
        revision_log_message: row.get(9)?,
        force_pull: row.get(10)?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

impl Database {
    fn map_link_conflict(err: rusqlite::Error, mo: &MappedObject) -> Error {
        if is_unique_violation(&err) {
            Error::DuplicateLink {
                salesforce_id: mo.salesforce_id.to_string(),
                mapping: mo.salesforce_mapping.clone(),
            }
        } else {
            Error::Database(err)
        }
    }

    /// Store a new mapped object.
    ///
    /// Returns the database-assigned ID, or [`Error::DuplicateLink`] if the
    /// remote record is already linked for this mapping.
    pub fn create_mapped_object(&self, mo: &MappedObject) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO mapped_objects (entity_type_id, entity_id, salesforce_id,
                 salesforce_mapping, entity_updated, last_sync, last_sync_action,
                 last_sync_status, revision_log_message, force_pull, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    mo.entity_type_id,
                    mo.entity_id,
                    mo.salesforce_id.as_str(),
                    mo.salesforce_mapping,
                    mo.entity_updated.map(format_timestamp),
                    mo.last_sync.map(format_timestamp),
                    mo.last_sync_action.as_str(),
                    mo.last_sync_status,
                    mo.revision_log_message,
                    mo.force_pull,
                    format_timestamp(mo.created_at),
                ],
            )
            .map_err(|e| Self::map_link_conflict(e, mo))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a mapped object by ID.
    pub fn get_mapped_object(&self, id: i64) -> Result<MappedObject> {
        let sql = format!("SELECT {COLUMNS} FROM mapped_objects WHERE id = ?1");
        self.conn
            .query_row(&sql, [id], row_to_mapped_object)
            .optional()?
            .ok_or(Error::MappedObjectNotFound(id))
    }

    /// Find the link for a remote record under one mapping.
    pub fn find_mapped_object(
        &self,
        salesforce_id: &RemoteId,
        mapping_id: &str,
    ) -> Result<Option<MappedObject>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM mapped_objects
             WHERE salesforce_id = ?1 AND salesforce_mapping = ?2"
        );
        let mo = self
            .conn
            .query_row(&sql, params![salesforce_id.as_str(), mapping_id], row_to_mapped_object)
            .optional()?;
        Ok(mo)
    }

    /// All links referencing a remote record, across mappings.
    pub fn find_mapped_objects_by_salesforce_id(
        &self,
        salesforce_id: &RemoteId,
    ) -> Result<Vec<MappedObject>> {
        let sql = format!("SELECT {COLUMNS} FROM mapped_objects WHERE salesforce_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map([salesforce_id.as_str()], row_to_mapped_object)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// Find the link for a local entity under one mapping.
    pub fn find_mapped_object_for_entity(
        &self,
        entity_type_id: &str,
        entity_id: &str,
        mapping_id: &str,
    ) -> Result<Option<MappedObject>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM mapped_objects
             WHERE entity_type_id = ?1 AND entity_id = ?2 AND salesforce_mapping = ?3
             ORDER BY id LIMIT 1"
        );
        let mo = self
            .conn
            .query_row(&sql, params![entity_type_id, entity_id, mapping_id], row_to_mapped_object)
            .optional()?;
        Ok(mo)
    }

    /// List links, optionally for one mapping, oldest first.
    pub fn list_mapped_objects(&self, mapping_id: Option<&str>) -> Result<Vec<MappedObject>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM mapped_objects
             WHERE ?1 IS NULL OR salesforce_mapping = ?1
             ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map([mapping_id], row_to_mapped_object)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// Write back every mutable column of a stored link.
    pub fn update_mapped_object(&self, mo: &MappedObject) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE mapped_objects SET entity_type_id = ?1, entity_id = ?2,
                 salesforce_id = ?3, salesforce_mapping = ?4, entity_updated = ?5,
                 last_sync = ?6, last_sync_action = ?7, last_sync_status = ?8,
                 revision_log_message = ?9, force_pull = ?10
                 WHERE id = ?11",
                params![
                    mo.entity_type_id,
                    mo.entity_id,
                    mo.salesforce_id.as_str(),
                    mo.salesforce_mapping,
                    mo.entity_updated.map(format_timestamp),
                    mo.last_sync.map(format_timestamp),
                    mo.last_sync_action.as_str(),
                    mo.last_sync_status,
                    mo.revision_log_message,
                    mo.force_pull,
                    mo.id,
                ],
            )
            .map_err(|e| Self::map_link_conflict(e, mo))?;
        if changed == 0 {
            return Err(Error::MappedObjectNotFound(mo.id));
        }
        Ok(())
    }

    /// Set or clear the persisted force-pull flag.
    pub fn set_force_pull(&self, id: i64, force_pull: bool) -> Result<()> {
        let changed = self
            .conn
            .execute("UPDATE mapped_objects SET force_pull = ?1 WHERE id = ?2", params![force_pull, id])?;
        if changed == 0 {
            return Err(Error::MappedObjectNotFound(id));
        }
        Ok(())
    }

    /// Delete a link. Returns false if it did not exist.
    pub fn delete_mapped_object(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM mapped_objects WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn count_mapped_objects(&self) -> Result<usize> {
        let count: i64 =
            self.conn.query_row("SELECT COUNT(*) FROM mapped_objects", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
#[path = "mapped_objects_tests.rs"]
mod tests;
