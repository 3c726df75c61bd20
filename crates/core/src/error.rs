// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sfsync-core operations.

use thiserror::Error;

use crate::remote::RemoteError;

/// Broad classification of an [`Error`], used by callers that only need to
/// decide how to react (retry, fail the item, abort the batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Mapping or settings are wrong; retrying will not help.
    Configuration,
    /// A referenced entity, link, mapping or queue item does not exist.
    NotFound,
    /// The remote API failed.
    Remote,
    /// The remote session is not authorized.
    Authorization,
    /// Stored state contradicts an invariant (duplicate link, etc).
    Consistency,
    /// Local storage failed.
    Storage,
    /// The caller used an operation incorrectly.
    Usage,
}

/// All possible errors that can occur in sfsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("mapping not found: {0}")]
    MappingNotFound(String),

    #[error("mapped object not found: {0}")]
    MappedObjectNotFound(i64),

    #[error("entity not found: {entity_type} {entity_id}")]
    EntityNotFound {
        entity_type: String,
        entity_id: String,
    },

    #[error("mapping {mapping} has no key field\n  hint: set `key` to a remote field that is targeted by a field mapping")]
    NoKeyField { mapping: String },

    #[error("key field {key} is not mapped in mapping {mapping}")]
    KeyFieldNotMapped { mapping: String, key: String },

    #[error("key field {key} has no local value for mapping {mapping}")]
    KeyValueMissing { mapping: String, key: String },

    #[error("invalid mapping {mapping}: {reason}")]
    InvalidMapping { mapping: String, reason: String },

    #[error("invalid field mapping: {0}")]
    InvalidFieldMapping(String),

    #[error("invalid sync trigger: '{0}'\n  hint: valid triggers are: push_create, push_update, push_delete, pull_create, pull_update, pull_delete")]
    InvalidTrigger(String),

    #[error("invalid operation: '{0}'\n  hint: valid operations are: create, update, delete")]
    InvalidOp(String),

    #[error("invalid sync action: '{0}'\n  hint: valid actions are: push, pull")]
    InvalidSyncAction(String),

    #[error("invalid severity: '{0}'\n  hint: valid severities are: notice, warning, error")]
    InvalidSeverity(String),

    #[error("invalid remote id: '{0}'\n  hint: remote ids are 15 or 18 alphanumeric characters")]
    InvalidRemoteId(String),

    #[error("remote record is missing {0}")]
    MalformedRecord(String),

    #[error("remote object {salesforce_id} is already linked for mapping {mapping}")]
    DuplicateLink {
        salesforce_id: String,
        mapping: String,
    },

    #[error("single-item claims are not supported\n  hint: use claim_items to claim a batch")]
    SingleClaimUnsupported,

    #[error("key write-back for {salesforce_id} failed: {source}")]
    PullRetry {
        salesforce_id: String,
        #[source]
        source: RemoteError,
    },

    #[error("entity store error: {0}")]
    EntityStore(String),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MappingNotFound(_)
            | Error::MappedObjectNotFound(_)
            | Error::EntityNotFound { .. }
            | Error::KeyFieldNotMapped { .. }
            | Error::KeyValueMissing { .. } => ErrorKind::NotFound,
            Error::NoKeyField { .. }
            | Error::InvalidMapping { .. }
            | Error::InvalidFieldMapping(_)
            | Error::Config(_) => ErrorKind::Configuration,
            Error::Remote(RemoteError::Unauthorized) => ErrorKind::Authorization,
            Error::Remote(_) | Error::PullRetry { .. } | Error::MalformedRecord(_) => {
                ErrorKind::Remote
            }
            Error::DuplicateLink { .. } | Error::CorruptedData(_) => ErrorKind::Consistency,
            Error::EntityStore(_) | Error::Database(_) | Error::Io(_) | Error::Json(_) => {
                ErrorKind::Storage
            }
            Error::InvalidTrigger(_)
            | Error::InvalidOp(_)
            | Error::InvalidSyncAction(_)
            | Error::InvalidSeverity(_)
            | Error::InvalidRemoteId(_)
            | Error::SingleClaimUnsupported
            | Error::InvalidInput(_) => ErrorKind::Usage,
        }
    }

    /// Whether the failed work should stay queued and be attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Remote(e) => e.is_retryable(),
            Error::PullRetry { .. } => true,
            Error::Database(_) | Error::Io(_) => true,
            _ => false,
        }
    }

    /// Whether this error must abort the whole batch rather than one item.
    pub fn is_batch_fatal(&self) -> bool {
        self.kind() == ErrorKind::Authorization
    }
}

/// A specialized Result type for sfsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
