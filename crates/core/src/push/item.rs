// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::trigger::LocalOp;

/// A pending local change waiting to be pushed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueItem {
    pub item_id: i64,
    pub mapping_id: String,
    pub entity_id: String,
    pub op: LocalOp,
    /// Opaque data supplied by change capture.
    pub payload: Option<Value>,
    pub fail_count: u32,
    /// Bumped every time a newer change is merged into this item.
    pub revision: i64,
    /// Lease expiry in unix seconds; 0 when unclaimed.
    pub expire: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl QueueItem {
    /// Whether a live lease is held at `now`.
    pub fn is_claimed(&self, now: DateTime<Utc>) -> bool {
        self.expire != 0 && self.expire > now.timestamp()
    }
}
