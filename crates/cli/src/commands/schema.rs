// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Schema command implementation.
//!
//! Outputs JSON Schema documents for commands that support JSON output.

use crate::cli::SchemaCommand;
use crate::error::Result;
use crate::schema::{LinksOutputJson, MappingsOutputJson, QueueOutputJson, StateOutputJson};
use schemars::schema::RootSchema;
use schemars::schema_for;

pub(crate) fn schema(cmd: SchemaCommand) -> RootSchema {
    match cmd {
        SchemaCommand::Mappings => schema_for!(MappingsOutputJson),
        SchemaCommand::Queue => schema_for!(QueueOutputJson),
        SchemaCommand::Links => schema_for!(LinksOutputJson),
        SchemaCommand::State => schema_for!(StateOutputJson),
    }
}

/// Run the schema command.
pub fn run(cmd: SchemaCommand) -> Result<()> {
    let json = serde_json::to_string_pretty(&schema(cmd))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
