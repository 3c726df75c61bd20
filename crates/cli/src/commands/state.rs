// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sfsync_core::db::keys;
use sfsync_core::Database;

use crate::cli::{OutputFormat, StateCommand};
use crate::config::Config;
use crate::error::Result;
use crate::schema::{StateEntryJson, StateOutputJson};

use super::{open_db, print_json};

pub fn run(config: &Config, cmd: StateCommand) -> Result<()> {
    let db = open_db(config)?;
    match cmd {
        StateCommand::Show { output } => show(&db, output),
        StateCommand::ResetDelete { object_type } => {
            if reset_delete(&db, &object_type)? {
                println!("Reset deletion checkpoint for {object_type}");
            } else {
                println!("No deletion checkpoint stored for {object_type}");
            }
            Ok(())
        }
        StateCommand::ResetPull { mapping } => {
            let removed = reset_pull(&db, &mapping)?;
            println!("Removed {removed} pull state entr{} for {mapping}", if removed == 1 { "y" } else { "ies" });
            Ok(())
        }
    }
}

fn show(db: &Database, output: OutputFormat) -> Result<()> {
    let entries = db.list_state()?;
    match output {
        OutputFormat::Json => print_json(&StateOutputJson {
            entries: entries
                .into_iter()
                .map(|(key, value)| StateEntryJson { key, value })
                .collect(),
        }),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No sync state recorded");
            }
            for (key, value) in &entries {
                println!("{key} = {value}");
            }
            Ok(())
        }
    }
}

/// Forget the deletion checkpoint so the next poll starts from the lookback window.
pub(crate) fn reset_delete(db: &Database, object_type: &str) -> Result<bool> {
    let removed = db.delete_state(&keys::delete_checkpoint(object_type))?;
    tracing::info!(object_type, removed, "reset deletion checkpoint");
    Ok(removed)
}

/// Forget a mapping's pull checkpoint and last run; the next pull is due
/// immediately and starts from the lookback window.
pub(crate) fn reset_pull(db: &Database, mapping_id: &str) -> Result<usize> {
    let mut removed = 0;
    for key in [keys::pull_checkpoint(mapping_id), keys::pull_last_run(mapping_id)] {
        if db.delete_state(&key)? {
            removed += 1;
        }
    }
    tracing::info!(mapping = mapping_id, removed, "reset pull state");
    Ok(removed)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
