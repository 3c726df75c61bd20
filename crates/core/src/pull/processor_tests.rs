// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::entity::{MemoryEntityStore, WriteKind};
use crate::field::FieldMapping;
use crate::mapping::Mapping;
use crate::notify::Severity;
use crate::remote::RemoteError;
use crate::test_helpers::{contact_mapping, sfid, t0, user, Fixture, RemoteCall};
use crate::trigger::TriggerSet;
use serde_json::json;
use yare::parameterized;

const BEFORE_T0: &str = "2024-03-31T12:00:00.000+0000";
const AFTER_T0: &str = "2024-04-01T10:00:00.000+0000";

fn contact(n: u32, modified: &str) -> RemoteRecord {
    RemoteRecord::new(sfid(n), "Contact")
        .with_field("Email", "grace@navy.mil")
        .with_field("LastName", "Hopper")
        .with_field("LastModifiedDate", modified)
}

fn processor(fx: &Fixture) -> PullProcessor<'_> {
    PullProcessor::from_context(&fx.ctx())
}

/// A linked local user last changed at t0.
fn linked_user(fx: &Fixture, n: u32) -> (String, i64) {
    let id = fx.store.insert(user("ada@example.com").with_changed(t0()));
    let link = MappedObject::new("user", &id, sfid(n), "contacts", SyncAction::Push, t0());
    let link_id = fx.db.create_mapped_object(&link).unwrap();
    (id, link_id)
}

#[test]
fn creates_entity_and_link() {
    let fx = Fixture::new(vec![contact_mapping()]);

    let outcome = processor(&fx).process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap();

    assert_eq!(outcome, PullOutcome::Created);
    let link = fx.db.find_mapped_object(&sfid(1), "contacts").unwrap().unwrap();
    assert_eq!(link.last_sync_action, SyncAction::Pull);
    let entity = fx.store.get("user", &link.entity_id).unwrap();
    assert_eq!(entity.bundle, "user");
    assert_eq!(entity.get("mail"), Some(&json!("grace@navy.mil")));
    assert_eq!(entity.get("name"), Some(&json!("Hopper")));
    assert!(fx.store.writes().iter().all(|w| w.origin == Origin::RemoteSync));
}

#[test]
fn create_requires_pull_create() {
    let mapping = contact_mapping().with_triggers(TriggerSet::all().without(SyncTrigger::PullCreate));
    let fx = Fixture::new(vec![mapping]);

    let outcome = processor(&fx).process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap();

    assert_eq!(outcome, PullOutcome::Skipped);
    assert!(fx.store.is_empty());
    assert_eq!(fx.db.count_mapped_objects().unwrap(), 0);
}

#[test]
fn update_requires_pull_update() {
    let mapping = contact_mapping().with_triggers(TriggerSet::all().without(SyncTrigger::PullUpdate));
    let fx = Fixture::new(vec![mapping]);
    let (id, _) = linked_user(&fx, 1);

    let outcome = processor(&fx).process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap();

    assert_eq!(outcome, PullOutcome::Skipped);
    assert_eq!(fx.store.get("user", &id).unwrap().get("mail"), Some(&json!("ada@example.com")));
}

#[parameterized(
    newer = { AFTER_T0, false, PullOutcome::Updated, "grace@navy.mil" },
    older = { BEFORE_T0, false, PullOutcome::Unchanged, "ada@example.com" },
    same = { "2024-04-01T09:00:00.000+0000", false, PullOutcome::Unchanged, "ada@example.com" },
    older_forced = { BEFORE_T0, true, PullOutcome::Updated, "grace@navy.mil" },
    undated = { "", false, PullOutcome::Unchanged, "ada@example.com" },
)]
fn update_applies_only_newer(modified: &str, force: bool, expected: PullOutcome, mail: &str) {
    let fx = Fixture::new(vec![contact_mapping()]);
    let (id, _) = linked_user(&fx, 1);
    let mut item = PullItem::new("contacts", contact(1, modified));
    if force {
        item = item.forced();
    }

    assert_eq!(processor(&fx).process_item(&item).unwrap(), expected);
    assert_eq!(fx.store.get("user", &id).unwrap().get("mail"), Some(&json!(mail)));
}

#[test]
fn successful_update_marks_link() {
    let fx = Fixture::new(vec![contact_mapping()]);
    let (_, link_id) = linked_user(&fx, 1);

    processor(&fx).process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap();

    let link = fx.db.get_mapped_object(link_id).unwrap();
    assert_eq!(link.last_sync_action, SyncAction::Pull);
    assert!(link.last_sync_status);
    assert_eq!(link.last_sync, Some(t0()));
    assert!(fx.notifier.contains(Severity::Notice, "Updated entity"));
}

#[test]
fn persisted_force_pull_is_honoured_and_cleared() {
    let fx = Fixture::new(vec![contact_mapping()]);
    let (id, link_id) = linked_user(&fx, 1);
    fx.db.set_force_pull(link_id, true).unwrap();

    let outcome = processor(&fx).process_item(&PullItem::new("contacts", contact(1, BEFORE_T0))).unwrap();

    assert_eq!(outcome, PullOutcome::Updated);
    assert_eq!(fx.store.get("user", &id).unwrap().get("mail"), Some(&json!("grace@navy.mil")));
    assert!(!fx.db.get_mapped_object(link_id).unwrap().force_pull);
}

#[test]
fn pulling_twice_is_idempotent() {
    let fx = Fixture::new(vec![contact_mapping()]);
    let item = PullItem::new("contacts", contact(1, AFTER_T0));

    assert_eq!(processor(&fx).process_item(&item).unwrap(), PullOutcome::Created);
    let link = fx.db.find_mapped_object(&sfid(1), "contacts").unwrap().unwrap();
    let before = fx.store.get("user", &link.entity_id).unwrap();

    assert_eq!(processor(&fx).process_item(&item).unwrap(), PullOutcome::Unchanged);
    assert_eq!(fx.store.get("user", &link.entity_id).unwrap().fields, before.fields);
}

#[test]
fn missing_local_entity_keeps_link() {
    let fx = Fixture::new(vec![contact_mapping()]);
    let link = MappedObject::new("user", "99", sfid(1), "contacts", SyncAction::Push, t0());
    let link_id = fx.db.create_mapped_object(&link).unwrap();

    let outcome = processor(&fx).process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap();

    assert_eq!(outcome, PullOutcome::Failed);
    assert!(fx.db.get_mapped_object(link_id).is_ok());
    assert!(fx.notifier.contains(Severity::Error, "does not currently exist"));
}

#[test]
fn unknown_mapping_is_skipped() {
    let fx = Fixture::new(vec![contact_mapping()]);
    let outcome = processor(&fx).process_item(&PullItem::new("leads", contact(1, AFTER_T0))).unwrap();
    assert_eq!(outcome, PullOutcome::Skipped);
    assert_eq!(fx.notifier.count(Severity::Warning), 1);
}

fn keyed_mapping() -> Mapping {
    contact_mapping()
        .with_field(FieldMapping::entity_id("Drupal_Id__c"))
        .with_key(Some("Drupal_Id__c"))
}

#[test]
fn create_writes_key_back() {
    let fx = Fixture::new(vec![keyed_mapping()]);

    processor(&fx).process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap();

    let link = fx.db.find_mapped_object(&sfid(1), "contacts").unwrap().unwrap();
    assert_eq!(
        fx.remote.calls(),
        vec![RemoteCall::Update {
            object_type: "Contact".to_string(),
            id: sfid(1),
            params: PushParams::single("Drupal_Id__c", json!(link.entity_id)),
        }]
    );
}

#[test]
fn update_writes_key_back_before_staleness_check() {
    let fx = Fixture::new(vec![keyed_mapping()]);
    let (id, _) = linked_user(&fx, 1);

    let outcome = processor(&fx).process_item(&PullItem::new("contacts", contact(1, BEFORE_T0))).unwrap();

    assert_eq!(outcome, PullOutcome::Unchanged);
    match &fx.remote.calls()[..] {
        [RemoteCall::Update { params, .. }] => assert_eq!(params.get("Drupal_Id__c"), Some(&json!(id))),
        other => panic!("expected one update, got {other:?}"),
    }
}

#[test]
fn key_already_present_is_not_written() {
    let fx = Fixture::new(vec![keyed_mapping()]);
    let record = contact(1, AFTER_T0).with_field("Drupal_Id__c", "7");

    processor(&fx).process_item(&PullItem::new("contacts", record)).unwrap();
    assert!(fx.remote.calls().is_empty());
}

#[test]
fn key_write_back_needs_push_triggers() {
    let mapping = keyed_mapping().with_triggers(TriggerSet::new().with(SyncTrigger::PullCreate));
    let fx = Fixture::new(vec![mapping]);

    processor(&fx).process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap();
    assert!(fx.remote.calls().is_empty());
}

#[test]
fn failed_write_back_is_retryable() {
    let fx = Fixture::new(vec![keyed_mapping()]);
    let (_, _) = linked_user(&fx, 1);
    fx.remote.fail_update(Some(RemoteError::from_status(500, "boom")));

    let err = processor(&fx).process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap_err();

    assert!(matches!(err, Error::PullRetry { .. }));
    assert!(err.is_retryable());
}

#[test]
fn batch_collects_retries() {
    let fx = Fixture::new(vec![keyed_mapping()]);
    linked_user(&fx, 1);
    fx.remote.fail_update(Some(RemoteError::Timeout));
    let items = vec![
        PullItem::new("contacts", contact(1, AFTER_T0)),
        PullItem::new("contacts", contact(2, AFTER_T0).with_field("Drupal_Id__c", "5")),
    ];

    let report = processor(&fx).process_batch(&items);

    assert_eq!(report.created, 1);
    assert_eq!(report.retry, vec![sfid(1)]);
}

/// Links the record under another entity during save, like a concurrent run.
struct RacingStore<'a> {
    inner: MemoryEntityStore,
    db: &'a Database,
}

impl EntityStore for RacingStore<'_> {
    fn load(&self, entity_type: &str, entity_id: &str) -> Result<Option<Entity>> {
        self.inner.load(entity_type, entity_id)
    }

    fn save(&self, entity: &mut Entity, origin: Origin) -> Result<()> {
        let winner = MappedObject::new("user", "winner", sfid(1), "contacts", SyncAction::Pull, t0());
        self.db.create_mapped_object(&winner)?;
        self.inner.save(entity, origin)
    }

    fn delete(&self, entity: &Entity, origin: Origin) -> Result<()> {
        self.inner.delete(entity, origin)
    }
}

#[test]
fn concurrent_link_discards_new_entity() {
    let fx = Fixture::new(vec![contact_mapping()]);
    let store = RacingStore { inner: MemoryEntityStore::new(), db: &fx.db };
    let processor = PullProcessor::new(&fx.db, &fx.mappings, &fx.remote, &store, &fx.notifier, &fx.clock);

    let outcome = processor.process_item(&PullItem::new("contacts", contact(1, AFTER_T0))).unwrap();

    assert_eq!(outcome, PullOutcome::Duplicate);
    assert!(store.inner.is_empty());
    assert_eq!(store.inner.writes().last().unwrap().kind, WriteKind::Delete);
    assert_eq!(fx.db.find_mapped_object(&sfid(1), "contacts").unwrap().unwrap().entity_id, "winner");
    assert!(fx.notifier.contains(Severity::Warning, "linked by another run"));
}
