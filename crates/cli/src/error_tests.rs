// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn config_not_found_has_hint() {
    let err = Error::ConfigNotFound("/etc/sfsync.toml".to_string());
    assert!(err.to_string().contains("/etc/sfsync.toml"));
    assert!(err.to_string().contains("hint:"));
}

#[test]
fn op_not_pushed_names_trigger() {
    let err = Error::OpNotPushed { mapping: "contacts".to_string(), op: "delete".to_string() };
    assert!(err.to_string().contains("mapping contacts does not push delete changes"));
    assert!(err.to_string().contains("push_delete"));
}

#[test]
fn core_errors_display_unchanged() {
    let core = sfsync_core::Error::MappingNotFound("leads".to_string());
    let expected = core.to_string();
    let err: Error = core.into();
    assert_eq!(err.to_string(), expected);
}

#[test]
fn io_errors_convert() {
    let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(err.to_string().starts_with("io error:"));
}
