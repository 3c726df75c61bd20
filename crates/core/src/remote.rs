// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The remote API collaborator.
//!
//! Transport, authentication and per-call timeouts belong to the
//! implementation of [`RemoteApi`]; the engines only see typed results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::mapping::PushParams;
use crate::record::{RemoteId, RemoteRecord};

/// Errors returned by a [`RemoteApi`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote session is not authorized")]
    Unauthorized,

    #[error("remote record not found: {0}")]
    NotFound(String),

    #[error("remote API returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote call timed out")]
    Timeout,

    #[error("malformed remote response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Classifies an HTTP failure.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => RemoteError::Unauthorized,
            404 => RemoteError::NotFound(message),
            _ => RemoteError::Http { status, message },
        }
    }

    /// Transport failures, timeouts and server errors may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Transport(_) | RemoteError::Timeout => true,
            RemoteError::Http { status, .. } => *status >= 500 || *status == 429,
            RemoteError::Unauthorized | RemoteError::NotFound(_) | RemoteError::Malformed(_) => {
                false
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// A [`RemoteApi`] result.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// One entry of a deleted-records response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRecord {
    pub id: String,
    #[serde(default)]
    pub deleted_date: Option<String>,
}

/// Response of [`RemoteApi::get_deleted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRecords {
    #[serde(default)]
    pub deleted_records: Vec<DeletedRecord>,
    #[serde(default)]
    pub earliest_date_available: Option<String>,
    #[serde(default)]
    pub latest_date_covered: Option<String>,
}

/// Operations the engines need from the remote API.
pub trait RemoteApi {
    /// Whether the current session can make calls at all.
    fn is_authorized(&self) -> bool;

    /// Runs a SOQL-like query and returns the matching records.
    fn query(&self, soql: &str) -> RemoteResult<Vec<RemoteRecord>>;

    fn object_create(&self, object_type: &str, params: &PushParams) -> RemoteResult<RemoteId>;

    fn object_update(
        &self,
        object_type: &str,
        id: &RemoteId,
        params: &PushParams,
    ) -> RemoteResult<()>;

    /// Creates or updates the record whose `key_field` equals `key_value`.
    fn object_upsert(
        &self,
        object_type: &str,
        key_field: &str,
        key_value: &Value,
        params: &PushParams,
    ) -> RemoteResult<RemoteId>;

    fn object_delete(&self, object_type: &str, id: &RemoteId) -> RemoteResult<()>;

    fn object_read(&self, object_type: &str, id: &RemoteId) -> RemoteResult<RemoteRecord>;

    /// Records of `object_type` deleted between `start` and `end`
    /// (ISO 8601, at least 60 seconds apart).
    fn get_deleted(&self, object_type: &str, start: &str, end: &str)
        -> RemoteResult<DeletedRecords>;
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
