// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use chrono::{TimeZone, Utc};
use sfsync_core::{Database, MappedObject, RemoteId, SyncAction};

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub const MAPPINGS_TOML: &str = r#"
[[mapping]]
id = "contacts"
label = "Contacts"
drupal_entity_type = "user"
drupal_bundle = "user"
salesforce_object_type = "Contact"
sync_triggers = ["push_create", "push_update", "push_delete", "pull_create", "pull_update", "pull_delete"]

[[mapping.field]]
drupal_field_type = "properties"
drupal_field_value = "mail"
salesforce_field = "Email"

[[mapping]]
id = "leads"
drupal_entity_type = "node"
drupal_bundle = "lead"
salesforce_object_type = "Lead"
sync_triggers = ["pull_create", "pull_update"]

[[mapping.field]]
drupal_field_type = "properties"
drupal_field_value = "title"
salesforce_field = "LastName"
"#;

/// `sfsync` run inside `temp`, with logging silenced.
pub fn sfsync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("sfsync");
    cmd.current_dir(temp.path()).env("SFSYNC_LOG", "off");
    cmd
}

/// A temp directory holding `sfsync.toml` and `mappings.toml`.
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("sfsync.toml"), "database = \"sfsync.db\"\nmappings = \"mappings.toml\"\n")
        .unwrap();
    std::fs::write(temp.path().join("mappings.toml"), MAPPINGS_TOML).unwrap();
    temp
}

pub fn db_path(temp: &TempDir) -> PathBuf {
    temp.path().join("sfsync.db")
}

pub fn open_db(temp: &TempDir) -> Database {
    Database::open(&db_path(temp)).unwrap()
}

pub fn sfid(n: u32) -> RemoteId {
    RemoteId::parse(&format!("003{:012}AAA", n)).unwrap()
}

/// Store a link from user `entity_id` to remote record `n` and return its id.
pub fn create_link(temp: &TempDir, entity_id: &str, n: u32) -> i64 {
    let now = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
    let link = MappedObject::new("user", entity_id, sfid(n), "contacts", SyncAction::Push, now);
    open_db(temp).create_mapped_object(&link).unwrap()
}

/// Run `sfsync` with `args` and parse its stdout as JSON.
pub fn json_output(temp: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = sfsync(temp).args(args).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}
