// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber setup for sync events and diagnostics.
//!
//! `SFSYNC_LOG` takes an `EnvFilter` directive and overrides the configured
//! `log_level`. Output goes to stderr so command output on stdout stays
//! parseable.

use sfsync_core::Severity;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "SFSYNC_LOG";

/// The filter directive matching a minimum event severity.
pub fn default_directive(level: Severity) -> &'static str {
    match level {
        Severity::Notice => "info",
        Severity::Warning => "warn",
        Severity::Error => "error",
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(level: Severity) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
