// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sfsync - administration of the sync state kept by `sfsync-core`.
//!
//! This crate provides the `sfsync` command line. It works on the same
//! SQLite database and mapping file as the sync runners.
//!
//! # Main Components
//!
//! - [`Config`] - `sfsync.toml`: database and mapping paths, log level, engine tuning
//! - [`Cli`] / [`Command`] - clap definitions of the command tree
//! - [`Error`] - Error types for all commands
//!
//! ```rust,ignore
//! use sfsync::{Config, Command};
//!
//! let config = Config::discover(None)?;
//! let db = sfsync_core::Database::open(&config.database_path())?;
//! ```

mod cli;
mod commands;
mod schema;

pub mod config;
pub mod error;
pub mod logging;

pub use cli::{
    Cli, Command, LinksCommand, MappingsCommand, OutputFormat, QueueCommand, SchemaCommand, StateCommand,
};
pub use config::Config;
pub use error::{Error, Result};

use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;

/// Load the configuration and install logging for a command that needs them.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::discover(config_path)?;
    logging::init(config.log_level);
    Ok(config)
}

pub fn run(config_path: Option<&Path>, command: Command) -> Result<()> {
    match command {
        Command::Mappings(cmd) => commands::mappings::run(&load_config(config_path)?, cmd),
        Command::Queue(cmd) => commands::queue::run(&load_config(config_path)?, cmd),
        Command::Links(cmd) => commands::links::run(&load_config(config_path)?, cmd),
        Command::State(cmd) => commands::state::run(&load_config(config_path)?, cmd),
        Command::Schema(cmd) => commands::schema::run(cmd),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sfsync", &mut std::io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
