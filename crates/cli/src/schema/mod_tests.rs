// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use serde_json::json;
use sfsync_core::RemoteId;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
}

#[test]
fn field_json_covers_each_variant() {
    let property = FieldJson::from(&FieldMapping::property("mail", "Email"));
    assert_eq!(property.drupal_field_type, "properties");
    assert_eq!(property.drupal_field_value, Some(json!("mail")));
    assert!(property.pull);

    let constant = FieldJson::from(&FieldMapping::constant("LeadSource", "Web"));
    assert_eq!(constant.drupal_field_value, Some(json!("Web")));
    assert!(!constant.pull);

    let entity_id = FieldJson::from(&FieldMapping::entity_id("Drupal_Id__c"));
    assert_eq!(entity_id.drupal_field_type, "entity_id");
    assert!(entity_id.drupal_field_value.is_none());
}

#[test]
fn mapping_json_uses_file_names() {
    let mapping = Mapping::new("contacts", "user", "user", "Contact")
        .with_field(FieldMapping::property("mail", "Email"))
        .with_async(true);

    let json = serde_json::to_value(MappingJson::from(&mapping)).unwrap();

    assert_eq!(json["id"], "contacts");
    assert_eq!(json["async"], true);
    assert_eq!(json["fields"][0]["salesforce_field"], "Email");
    assert_eq!(json["sync_triggers"].as_array().unwrap().len(), 6);
    assert!(json.get("key").is_none());
}

#[test]
fn queue_item_json_reports_lease() {
    let item = QueueItem {
        item_id: 1,
        mapping_id: "contacts".to_string(),
        entity_id: "42".to_string(),
        op: LocalOp::Update,
        payload: None,
        fail_count: 0,
        revision: 1,
        expire: t0().timestamp() + 60,
        created: t0(),
        updated: t0(),
    };

    let live = QueueItemJson::new(&item, t0());
    assert!(live.claimed);
    assert_eq!(live.lease_expires, Some(t0() + chrono::Duration::seconds(60)));

    let expired = QueueItemJson::new(&item, t0() + chrono::Duration::hours(1));
    assert!(!expired.claimed);
    assert!(expired.lease_expires.is_none());

    let json = serde_json::to_value(live).unwrap();
    assert_eq!(json["op"], "update");
}

#[test]
fn link_json_has_canonical_id() {
    let sfid = RemoteId::parse("003000000000001").unwrap();
    let mut link = MappedObject::new("user", "42", sfid.clone(), "contacts", SyncAction::Push, t0());
    link.id = 9;

    let json = serde_json::to_value(LinkJson::from(&link)).unwrap();

    assert_eq!(json["id"], 9);
    assert_eq!(json["salesforce_id"], sfid.to_string());
    assert_eq!(json["salesforce_id"].as_str().unwrap().len(), 18);
    assert_eq!(json["last_sync_action"], "push");
    assert!(json.get("revision_log_message").is_none());
}
