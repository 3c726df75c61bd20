// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    lowercase = { "001000000000abc", "001000000000abcAAA" },
    all_upper = { "ABCDEABCDEABCDE", "ABCDEABCDEABCDE555" },
    mixed = { "003D000000NXyDQ", "003D000000NXyDQIA1" },
)]
fn remote_id_expands_short_form(short: &str, long: &str) {
    let id = RemoteId::parse(short).unwrap();
    assert_eq!(id.as_str(), long);
    assert_eq!(id.short(), short);
}

#[test]
fn remote_id_short_and_long_forms_are_equal() {
    let short = RemoteId::parse("003D000000NXyDQ").unwrap();
    let long = RemoteId::parse("003D000000NXyDQIA1").unwrap();
    assert_eq!(short, long);
}

#[parameterized(
    lowercase_suffix = { "003D000000NXyDQia1" },
    wrong_suffix = { "003D000000NXyDQAAA" },
)]
fn remote_id_rebuilds_long_suffix(input: &str) {
    let id = RemoteId::parse(input).unwrap();
    assert_eq!(id.as_str(), "003D000000NXyDQIA1");
    assert_eq!(id, RemoteId::parse("003D000000NXyDQ").unwrap());
}

#[parameterized(
    empty = { "" },
    too_short = { "003D000" },
    sixteen = { "003D000000NXyDQI" },
    punctuation = { "003D000000NX-DQ" },
)]
fn remote_id_rejects(input: &str) {
    assert!(matches!(RemoteId::parse(input), Err(Error::InvalidRemoteId(_))));
}

#[test]
fn remote_id_serde_normalises() {
    let id: RemoteId = serde_json::from_str(r#""003D000000NXyDQ""#).unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), r#""003D000000NXyDQIA1""#);
    assert!(serde_json::from_str::<RemoteId>(r#""bad""#).is_err());
}

#[parameterized(
    rfc3339 = { "2024-05-01T10:30:00Z" },
    offset_millis = { "2024-05-01T10:30:00.000+0000" },
    offset_colon = { "2024-05-01T12:30:00+02:00" },
    naive = { "2024-05-01T10:30:00" },
)]
fn parse_remote_datetime_forms(input: &str) {
    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
    assert_eq!(parse_remote_datetime(input), Some(expected));
}

#[test]
fn parse_remote_datetime_garbage() {
    assert_eq!(parse_remote_datetime("yesterday"), None);
}

#[test]
fn format_remote_datetime_uses_z_suffix() {
    let dt = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
    assert_eq!(format_remote_datetime(dt), "2024-05-01T10:30:00Z");
}

#[test]
fn record_from_json() {
    let record = RemoteRecord::from_json(json!({
        "attributes": { "type": "Contact", "url": "/x" },
        "Id": "003D000000NXyDQ",
        "Email": "a@example.com",
        "Phone": null,
    }))
    .unwrap();
    assert_eq!(record.object_type(), "Contact");
    assert_eq!(record.id().as_str(), "003D000000NXyDQIA1");
    assert_eq!(record.field("Email"), Some(&json!("a@example.com")));
    assert!(record.field("attributes").is_none());
    assert!(record.field("Phone").is_some());
    assert!(!record.has_value("Phone"));
    assert!(!record.has_value("Missing"));
}

#[parameterized(
    not_object = { json!([1, 2]) },
    no_id = { json!({ "attributes": { "type": "Contact" } }) },
    no_type = { json!({ "Id": "003D000000NXyDQ" }) },
)]
fn record_from_json_rejects(value: Value) {
    assert!(matches!(RemoteRecord::from_json(value), Err(Error::MalformedRecord(_))));
}

#[test]
fn record_datetime_field() {
    let id = RemoteId::parse("003D000000NXyDQ").unwrap();
    let record = RemoteRecord::new(id, "Contact")
        .with_field("LastModifiedDate", "2024-05-01T10:30:00.000+0000")
        .with_field("Bogus", "nope");
    assert_eq!(
        record.datetime("LastModifiedDate"),
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap())
    );
    assert_eq!(record.datetime("Bogus"), None);
    assert_eq!(record.datetime("Missing"), None);
}
