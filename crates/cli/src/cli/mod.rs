// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "sfsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and repair the sync state between local entities and a remote CRM")]
#[command(
    long_about = "Inspect and repair the sync state between local entities and a remote CRM.\n\n\
    Works on the same database and mapping files as the sync runners: the push queue, \
    mapped objects and the pull and delete checkpoints."
)]
pub struct Cli {
    /// Read configuration from <path> instead of ./sfsync.toml
    #[arg(short = 'c', long = "config", global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List, show and validate mappings
    #[command(subcommand)]
    Mappings(MappingsCommand),

    /// Inspect and manage the push queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Inspect and manage mapped objects
    #[command(subcommand)]
    Links(LinksCommand),

    /// Inspect and reset pull and delete checkpoints
    #[command(subcommand)]
    State(StateCommand),

    /// Output JSON Schema for commands with JSON output
    #[command(subcommand)]
    Schema(SchemaCommand),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum MappingsCommand {
    /// List mappings in declaration order
    List {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show one mapping
    Show {
        /// Mapping id
        id: String,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Validate the mappings file
    Check,

    /// Enable or disable sync triggers of a mapping
    #[command(after_help = "\
Examples:
  sfsync mappings triggers contacts --disable pull_delete     Stop propagating remote deletes
  sfsync mappings triggers contacts --enable push_create      Start pushing new entities")]
    Triggers {
        /// Mapping id
        id: String,

        /// Triggers to enable (comma-separated or repeated)
        #[arg(long, value_delimiter = ',')]
        enable: Vec<String>,

        /// Triggers to disable (comma-separated or repeated)
        #[arg(long, value_delimiter = ',')]
        disable: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// List pending push items, oldest first
    List {
        /// Only items of this mapping
        #[arg(long, short)]
        mapping: Option<String>,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Queue a local change for pushing
    #[command(after_help = "\
Examples:
  sfsync queue enqueue contacts 42 update                     Re-push entity 42
  sfsync queue enqueue contacts 42 delete                     Push a deletion
  sfsync queue enqueue contacts 42 create --payload '{\"a\":1}' Attach a payload")]
    Enqueue {
        /// Mapping id
        mapping: String,

        /// Local entity id
        entity_id: String,

        /// Operation (create, update, delete)
        op: String,

        /// JSON payload stored with the item
        #[arg(long)]
        payload: Option<String>,
    },

    /// Release leases so items can be claimed again
    Release {
        /// Release live leases too, not only expired ones
        #[arg(long)]
        all: bool,
    },

    /// Remove one item without pushing it
    Remove {
        /// Queue item id
        item_id: i64,
    },

    /// Remove every item, or every item of one mapping
    Purge {
        /// Only items of this mapping
        #[arg(long, short)]
        mapping: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum LinksCommand {
    /// List mapped objects
    List {
        /// Only links of this mapping
        #[arg(long, short)]
        mapping: Option<String>,

        /// Only links whose last sync failed
        #[arg(long)]
        failed: bool,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show one mapped object
    Show {
        /// Mapped object id
        id: i64,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Find mapped objects for a remote record id (15 or 18 characters)
    Find {
        /// Remote record id
        salesforce_id: String,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Apply the next pull of a record regardless of timestamps
    ForcePull {
        /// Mapped object id
        id: i64,

        /// Clear the flag instead of setting it
        #[arg(long)]
        clear: bool,
    },

    /// Delete a mapped object, leaving both records in place
    Delete {
        /// Mapped object id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum StateCommand {
    /// Show checkpoints and last-run times
    Show {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Forget the deletion checkpoint of a remote object type
    ResetDelete {
        /// Remote object type, e.g. Contact
        object_type: String,
    },

    /// Forget the pull checkpoint and last run of a mapping
    ResetPull {
        /// Mapping id
        mapping: String,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum SchemaCommand {
    /// Schema for `mappings list -o json`
    Mappings,
    /// Schema for `queue list -o json`
    Queue,
    /// Schema for `links list -o json`
    Links,
    /// Schema for `state show -o json`
    State,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
