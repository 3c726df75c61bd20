// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod links;
pub mod mappings;
pub mod queue;
pub mod schema;
pub mod state;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use serde::Serialize;
use sfsync_core::{Database, MappingSet};

use crate::config::Config;
use crate::error::{Error, Result};

/// Helper to open the sync database named by the configuration.
pub fn open_db(config: &Config) -> Result<Database> {
    let path = config.database_path();
    tracing::debug!(path = %path.display(), "opening database");
    Ok(Database::open(&path)?)
}

/// Helper to load the mappings file named by the configuration.
///
/// Unlike the sync runners, commands that need mappings refuse to work
/// from an empty set when the file is missing.
pub fn open_mappings(config: &Config) -> Result<MappingSet> {
    let path = config.mappings_path();
    if !path.is_file() {
        return Err(Error::MappingsNotFound(path.display().to_string()));
    }
    Ok(MappingSet::load(&path)?)
}

/// Print `value` as a single line of JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{json}");
    Ok(())
}
