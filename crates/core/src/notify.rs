// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The event sink.
//!
//! Engines report what they did through a single injected [`Notifier`].
//! Messages are templates with `%name` or `@name` placeholders filled from
//! the context args, so sinks can keep the template and the values apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Severity of a sync event. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl Severity {
    /// Returns the string representation used in config and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "notice" | "info" => Ok(Severity::Notice),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(Error::InvalidSeverity(s.to_string())),
        }
    }
}

/// Receives sync events.
pub trait Notifier {
    fn notify(&self, severity: Severity, error: Option<&Error>, template: &str, args: &[(&str, &str)]);

    fn notice(&self, template: &str, args: &[(&str, &str)]) {
        self.notify(Severity::Notice, None, template, args);
    }

    fn warning(&self, error: Option<&Error>, template: &str, args: &[(&str, &str)]) {
        self.notify(Severity::Warning, error, template, args);
    }

    fn error(&self, error: Option<&Error>, template: &str, args: &[(&str, &str)]) {
        self.notify(Severity::Error, error, template, args);
    }
}

/// Substitutes placeholders in `template`.
///
/// Arg names include their sigil (`%id`, `@label`). Longer names are
/// replaced first so `%id` never clobbers part of `%identity`.
pub fn render(template: &str, args: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, &str)> = args.iter().collect();
    sorted.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
    sorted.iter().fold(template.to_string(), |message, (name, value)| message.replace(*name, value))
}

/// A [`Notifier`] that emits `tracing` events.
#[derive(Debug, Clone, Copy)]
pub struct TracingNotifier {
    min_severity: Severity,
}

impl TracingNotifier {
    pub fn new(min_severity: Severity) -> Self {
        TracingNotifier { min_severity }
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        TracingNotifier::new(Severity::Notice)
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, error: Option<&Error>, template: &str, args: &[(&str, &str)]) {
        if severity < self.min_severity {
            return;
        }
        let message = render(template, args);
        match (severity, error) {
            (Severity::Notice, None) => tracing::info!("{}", message),
            (Severity::Notice, Some(e)) => tracing::info!(error = %e, "{}", message),
            (Severity::Warning, None) => tracing::warn!("{}", message),
            (Severity::Warning, Some(e)) => tracing::warn!(error = %e, "{}", message),
            (Severity::Error, None) => tracing::error!("{}", message),
            (Severity::Error, Some(e)) => tracing::error!(error = %e, "{}", message),
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
