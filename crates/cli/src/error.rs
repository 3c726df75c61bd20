// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the sfsync command line.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config file not found: {0}\n  hint: pass an existing file to --config, or omit it to use defaults")]
    ConfigNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("mappings file not found: {0}\n  hint: set `mappings` in sfsync.toml to the file holding your [[mapping]] tables")]
    MappingsNotFound(String),

    #[error("queue item not found: {0}")]
    QueueItemNotFound(i64),

    #[error("mapping {mapping} does not push {op} changes\n  hint: enable push_{op} in the mapping's sync_triggers")]
    OpNotPushed { mapping: String, op: String },

    #[error("invalid payload: {0}\n  hint: the payload must be a JSON document")]
    InvalidPayload(String),

    #[error("{0}")]
    Core(#[from] sfsync_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
