// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sfsync-core: bidirectional synchronization between a local entity store
//! and a remote CRM-style API.
//!
//! The crate is organised around three engines that share one SQLite
//! [`Database`] for their durable state:
//!
//! - [`push`] - the outbound queue of local changes, with claim/lease
//!   semantics, processor dispatch and retry accounting
//! - [`pull`] - per-record reconciliation of changed remote records into
//!   local entities
//! - [`delete`] - periodic propagation of remote deletions
//!
//! Everything outside the core is reached through traits: [`RemoteApi`] for
//! the remote side, [`EntityStore`] for the local side, [`Notifier`] for the
//! event sink and [`Clock`] for time.

pub mod clock;
pub mod context;
pub mod db;
pub mod delete;
pub mod entity;
pub mod error;
pub mod field;
pub mod mapped_object;
pub mod mapping;
pub mod notify;
pub mod pull;
pub mod push;
pub mod record;
pub mod remote;
pub mod trigger;

#[cfg(test)]
mod test_helpers;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{SyncContext, SyncSettings};
pub use db::Database;
pub use delete::{delete_window, DeleteHandler, DeleteRunSummary};
pub use entity::{Entity, EntityStore, MemoryEntityStore, Origin, StoreWrite, WriteKind};
pub use error::{Error, ErrorKind, Result};
pub use field::FieldMapping;
pub use mapped_object::{MappedObject, SyncAction};
pub use mapping::{Mapping, MappingSet, PushParams};
pub use notify::{Notifier, Severity, TracingNotifier};
pub use pull::{
    build_pull_query, PullBatchReport, PullFetcher, PullItem, PullOutcome, PullProcessor, PullRunSummary,
};
pub use push::{
    BatchReport, CaptureOutcome, Captured, ChangeCapture, FailOutcome, ProcessorRegistry, PushProcessor,
    PushQueue, PushRunSummary, PushScope, QueueItem, RestProcessor,
};
pub use record::{RemoteId, RemoteRecord};
pub use remote::{DeletedRecord, DeletedRecords, RemoteApi, RemoteError};
pub use trigger::{LocalOp, SyncTrigger, TriggerSet};
