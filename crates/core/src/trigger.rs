// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync triggers: the six kinds of change a mapping can react to.
//!
//! Push triggers fire on local changes, pull triggers on remote ones.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A kind of change a mapping may propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    /// A local entity was created.
    PushCreate,
    /// A local entity was updated.
    PushUpdate,
    /// A local entity was deleted.
    PushDelete,
    /// A remote record appeared with no local counterpart.
    PullCreate,
    /// A linked remote record changed.
    PullUpdate,
    /// A linked remote record was deleted.
    PullDelete,
}

impl SyncTrigger {
    /// Every trigger, in declaration order.
    pub const ALL: [SyncTrigger; 6] = [
        SyncTrigger::PushCreate,
        SyncTrigger::PushUpdate,
        SyncTrigger::PushDelete,
        SyncTrigger::PullCreate,
        SyncTrigger::PullUpdate,
        SyncTrigger::PullDelete,
    ];

    /// Triggers fired by local changes.
    pub const PUSH: [SyncTrigger; 3] =
        [SyncTrigger::PushCreate, SyncTrigger::PushUpdate, SyncTrigger::PushDelete];

    /// Triggers fired by remote changes.
    pub const PULL: [SyncTrigger; 3] =
        [SyncTrigger::PullCreate, SyncTrigger::PullUpdate, SyncTrigger::PullDelete];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::PushCreate => "push_create",
            SyncTrigger::PushUpdate => "push_update",
            SyncTrigger::PushDelete => "push_delete",
            SyncTrigger::PullCreate => "pull_create",
            SyncTrigger::PullUpdate => "pull_update",
            SyncTrigger::PullDelete => "pull_delete",
        }
    }

    pub fn is_push(&self) -> bool {
        SyncTrigger::PUSH.contains(self)
    }

    fn bit(self) -> u8 {
        match self {
            SyncTrigger::PushCreate => 1 << 0,
            SyncTrigger::PushUpdate => 1 << 1,
            SyncTrigger::PushDelete => 1 << 2,
            SyncTrigger::PullCreate => 1 << 3,
            SyncTrigger::PullUpdate => 1 << 4,
            SyncTrigger::PullDelete => 1 << 5,
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncTrigger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SyncTrigger::ALL
            .into_iter()
            .find(|t| t.as_str() == s.to_lowercase())
            .ok_or_else(|| Error::InvalidTrigger(s.to_string()))
    }
}

/// The set of triggers enabled on a mapping.
///
/// Serialized as a list of trigger names.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TriggerSet(u8);

impl TriggerSet {
    /// An empty set.
    pub fn new() -> Self {
        TriggerSet(0)
    }

    /// A set with every trigger enabled.
    pub fn all() -> Self {
        SyncTrigger::ALL.into_iter().collect()
    }

    pub fn contains(&self, trigger: SyncTrigger) -> bool {
        self.0 & trigger.bit() != 0
    }

    /// Returns true if any of `triggers` is in the set.
    pub fn contains_any(&self, triggers: &[SyncTrigger]) -> bool {
        triggers.iter().any(|t| self.contains(*t))
    }

    pub fn insert(&mut self, trigger: SyncTrigger) {
        self.0 |= trigger.bit();
    }

    pub fn remove(&mut self, trigger: SyncTrigger) {
        self.0 &= !trigger.bit();
    }

    /// Returns a copy with `trigger` added.
    pub fn with(mut self, trigger: SyncTrigger) -> Self {
        self.insert(trigger);
        self
    }

    /// Returns a copy with `trigger` removed.
    pub fn without(mut self, trigger: SyncTrigger) -> Self {
        self.remove(trigger);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Enabled triggers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = SyncTrigger> + '_ {
        SyncTrigger::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

impl FromIterator<SyncTrigger> for TriggerSet {
    fn from_iter<I: IntoIterator<Item = SyncTrigger>>(iter: I) -> Self {
        let mut set = TriggerSet::new();
        for trigger in iter {
            set.insert(trigger);
        }
        set
    }
}

impl fmt::Debug for TriggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for TriggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|t| t.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

impl Serialize for TriggerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for TriggerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let triggers = Vec::<SyncTrigger>::deserialize(deserializer)?;
        Ok(triggers.into_iter().collect())
    }
}

/// The local operation behind a queued push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalOp {
    Create,
    Update,
    Delete,
}

impl LocalOp {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalOp::Create => "create",
            LocalOp::Update => "update",
            LocalOp::Delete => "delete",
        }
    }

    /// The push trigger this operation fires.
    pub fn trigger(&self) -> SyncTrigger {
        match self {
            LocalOp::Create => SyncTrigger::PushCreate,
            LocalOp::Update => SyncTrigger::PushUpdate,
            LocalOp::Delete => SyncTrigger::PushDelete,
        }
    }
}

impl fmt::Display for LocalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LocalOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(LocalOp::Create),
            "update" => Ok(LocalOp::Update),
            "delete" => Ok(LocalOp::Delete),
            _ => Err(Error::InvalidOp(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
