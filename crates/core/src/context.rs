// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared collaborators and runtime settings for the sync engines.

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::db::Database;
use crate::entity::EntityStore;
use crate::mapping::MappingSet;
use crate::notify::Notifier;
use crate::remote::RemoteApi;

/// Runtime tuning shared by the engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Most items claimed across all mappings in one push run; 0 is unbounded.
    pub global_push_limit: usize,
    /// How long a claim stays exclusive.
    pub lease: Duration,
    /// Window start for the first delete poll of an object type.
    pub delete_lookback: Duration,
    /// Window start for the first pull of a mapping.
    pub pull_lookback: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            global_push_limit: 5000,
            lease: Duration::hours(1),
            delete_lookback: Duration::days(29),
            pull_lookback: Duration::days(29),
        }
    }
}

impl SyncSettings {
    /// Window start for the first delete poll at `now`.
    pub fn delete_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        lookback_start(now, self.delete_lookback)
    }

    /// Window start for the first pull at `now`.
    pub fn pull_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        lookback_start(now, self.pull_lookback)
    }
}

/// `now - lookback`, saturating at the earliest representable time.
fn lookback_start(now: DateTime<Utc>, lookback: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(lookback).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Borrowed collaborators for one sync run.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub db: &'a Database,
    pub mappings: &'a MappingSet,
    pub remote: &'a dyn RemoteApi,
    pub store: &'a dyn EntityStore,
    pub notifier: &'a dyn Notifier,
    pub clock: &'a dyn Clock,
    pub settings: &'a SyncSettings,
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
