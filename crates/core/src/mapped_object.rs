// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The link record between a local entity and a remote record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::record::RemoteId;

/// Direction of the last sync attempt on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Push,
    Pull,
}

impl SyncAction {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Push => "push",
            SyncAction::Pull => "pull",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "push" => Ok(SyncAction::Push),
            "pull" => Ok(SyncAction::Pull),
            _ => Err(Error::InvalidSyncAction(s.to_string())),
        }
    }
}

/// A persistent association between one local entity and one remote record.
///
/// At most one exists per `(salesforce_id, salesforce_mapping)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedObject {
    /// Database id; 0 until stored.
    pub id: i64,
    pub entity_type_id: String,
    pub entity_id: String,
    pub salesforce_id: RemoteId,
    /// Id of the owning mapping.
    pub salesforce_mapping: String,
    /// Last known local modification time.
    pub entity_updated: Option<DateTime<Utc>>,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_sync_action: SyncAction,
    pub last_sync_status: bool,
    /// Error text of the last failed sync.
    pub revision_log_message: Option<String>,
    /// Apply the next pull regardless of timestamps.
    pub force_pull: bool,
    pub created_at: DateTime<Utc>,
}

impl MappedObject {
    /// A successful link created by `action` at `now`.
    pub fn new(
        entity_type_id: impl Into<String>,
        entity_id: impl Into<String>,
        salesforce_id: RemoteId,
        salesforce_mapping: impl Into<String>,
        action: SyncAction,
        now: DateTime<Utc>,
    ) -> Self {
        MappedObject {
            id: 0,
            entity_type_id: entity_type_id.into(),
            entity_id: entity_id.into(),
            salesforce_id,
            salesforce_mapping: salesforce_mapping.into(),
            entity_updated: Some(now),
            last_sync: Some(now),
            last_sync_action: action,
            last_sync_status: true,
            revision_log_message: None,
            force_pull: false,
            created_at: now,
        }
    }

    /// Records a successful sync.
    pub fn record_success(
        &mut self,
        action: SyncAction,
        entity_updated: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        self.entity_updated = Some(entity_updated);
        self.last_sync = Some(now);
        self.last_sync_action = action;
        self.last_sync_status = true;
        self.revision_log_message = None;
        if action == SyncAction::Pull {
            self.force_pull = false;
        }
    }

    /// Records a failed sync with its error text.
    pub fn record_failure(&mut self, action: SyncAction, message: impl Into<String>, now: DateTime<Utc>) {
        self.last_sync = Some(now);
        self.last_sync_action = action;
        self.last_sync_status = false;
        self.revision_log_message = Some(message.into());
    }
}

#[cfg(test)]
#[path = "mapped_object_tests.rs"]
mod tests;
