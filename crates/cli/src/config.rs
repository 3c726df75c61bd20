// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command line configuration.
//!
//! Configuration is read from `sfsync.toml` and includes:
//! - `database`: the SQLite file holding links, the push queue and checkpoints
//! - `mappings`: the TOML file holding the `[[mapping]]` tables
//! - `log_level`: the least severe sync event that is reported
//! - `[push]` and `[delete]`: runtime tuning for the engines
//!
//! Relative paths are resolved against the directory of the config file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use sfsync_core::{Severity, SyncSettings};

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "sfsync.toml";
const DB_FILE_NAME: &str = "sfsync.db";
const MAPPINGS_FILE_NAME: &str = "mappings.toml";
/// Longest accepted push lease, one week.
const MAX_LEASE_SECS: u64 = 7 * 24 * 3600;
/// Longest accepted deletion lookback, about a century.
const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Settings loaded from `sfsync.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "default_mappings")]
    pub mappings: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub delete: DeleteConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConfig {
    /// Most items claimed in one push run; 0 is unbounded.
    #[serde(default = "default_global_limit")]
    pub global_limit: usize,
    /// Seconds a claimed item stays leased.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfig {
    /// Days the first deletion poll of an object type looks back.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

fn default_database() -> PathBuf {
    PathBuf::from(DB_FILE_NAME)
}

fn default_mappings() -> PathBuf {
    PathBuf::from(MAPPINGS_FILE_NAME)
}

fn default_log_level() -> Severity {
    Severity::Notice
}

fn default_global_limit() -> usize {
    5000
}

fn default_lease_secs() -> u64 {
    3600
}

fn default_lookback_days() -> u32 {
    29
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            global_limit: default_global_limit(),
            lease_secs: default_lease_secs(),
        }
    }
}

impl Default for DeleteConfig {
    fn default() -> Self {
        DeleteConfig {
            lookback_days: default_lookback_days(),
        }
    }
}

impl Config {
    /// Default configuration rooted at `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Config {
            database: default_database(),
            mappings: default_mappings(),
            log_level: default_log_level(),
            push: PushConfig::default(),
            delete: DeleteConfig::default(),
            base_dir: base_dir.into(),
        }
    }

    /// Load the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Find and load the configuration.
    ///
    /// An explicit path must exist. Otherwise `./sfsync.toml` is tried, then
    /// `sfsync/sfsync.toml` under the user config directory, and defaults
    /// rooted at the current directory are used when neither exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(Error::ConfigNotFound(path.display().to_string()));
            }
            return Config::load(path);
        }
        let candidates = [
            Some(cwd.join(CONFIG_FILE_NAME)),
            dirs::config_dir().map(|d| d.join("sfsync").join(CONFIG_FILE_NAME)),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config");
                return Config::load(&path);
            }
        }
        Ok(Config::with_base_dir(cwd))
    }

    fn validate(&self) -> Result<()> {
        if self.push.lease_secs == 0 || self.push.lease_secs > MAX_LEASE_SECS {
            return Err(Error::Config(format!(
                "push.lease_secs must be between 1 and {MAX_LEASE_SECS}, got {}",
                self.push.lease_secs
            )));
        }
        if self.delete.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(Error::Config(format!(
                "delete.lookback_days must be at most {MAX_LOOKBACK_DAYS}, got {}",
                self.delete.lookback_days
            )));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database)
    }

    pub fn mappings_path(&self) -> PathBuf {
        self.resolve(&self.mappings)
    }

    /// Engine tuning derived from the `[push]` and `[delete]` tables.
    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            global_push_limit: self.push.global_limit,
            lease: Duration::seconds(self.push.lease_secs.min(MAX_LEASE_SECS) as i64),
            delete_lookback: Duration::days(i64::from(self.delete.lookback_days)),
            ..SyncSettings::default()
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
