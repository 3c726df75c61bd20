// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    push_create = { "push_create", SyncTrigger::PushCreate },
    push_delete = { "push_delete", SyncTrigger::PushDelete },
    pull_update = { "pull_update", SyncTrigger::PullUpdate },
    uppercase = { "PULL_DELETE", SyncTrigger::PullDelete },
)]
fn trigger_from_str(input: &str, expected: SyncTrigger) {
    assert_eq!(input.parse::<SyncTrigger>().unwrap(), expected);
}

#[test]
fn trigger_from_str_rejects_unknown() {
    let err = "push_sideways".parse::<SyncTrigger>().unwrap_err();
    assert!(matches!(err, Error::InvalidTrigger(_)));
}

#[test]
fn trigger_push_pull_partition() {
    for trigger in SyncTrigger::ALL {
        assert_eq!(trigger.is_push(), SyncTrigger::PUSH.contains(&trigger));
        assert_ne!(SyncTrigger::PUSH.contains(&trigger), SyncTrigger::PULL.contains(&trigger));
    }
}

#[test]
fn trigger_set_insert_remove() {
    let mut set = TriggerSet::new();
    assert!(set.is_empty());
    set.insert(SyncTrigger::PullCreate);
    set.insert(SyncTrigger::PushUpdate);
    assert!(set.contains(SyncTrigger::PullCreate));
    assert!(!set.contains(SyncTrigger::PullDelete));
    set.remove(SyncTrigger::PullCreate);
    assert!(!set.contains(SyncTrigger::PullCreate));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![SyncTrigger::PushUpdate]);
}

#[test]
fn trigger_set_contains_any() {
    let set = TriggerSet::new().with(SyncTrigger::PushCreate);
    assert!(set.contains_any(&[SyncTrigger::PushCreate, SyncTrigger::PushUpdate]));
    assert!(!set.contains_any(&SyncTrigger::PULL));
    assert!(!set.contains_any(&[]));
}

#[test]
fn trigger_set_all_and_without() {
    let set = TriggerSet::all().without(SyncTrigger::PullDelete);
    assert_eq!(set.iter().count(), 5);
    assert!(!set.contains(SyncTrigger::PullDelete));
}

#[test]
fn trigger_set_serde_as_list() {
    let set = TriggerSet::new().with(SyncTrigger::PullUpdate).with(SyncTrigger::PushCreate);
    let json = serde_json::to_string(&set).unwrap();
    assert_eq!(json, r#"["push_create","pull_update"]"#);
    let parsed: TriggerSet = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, set);
}

#[test]
fn trigger_set_display() {
    let set = TriggerSet::new().with(SyncTrigger::PushDelete).with(SyncTrigger::PushCreate);
    assert_eq!(set.to_string(), "push_create, push_delete");
}

#[parameterized(
    create = { LocalOp::Create, SyncTrigger::PushCreate },
    update = { LocalOp::Update, SyncTrigger::PushUpdate },
    delete = { LocalOp::Delete, SyncTrigger::PushDelete },
)]
fn local_op_trigger(op: LocalOp, expected: SyncTrigger) {
    assert_eq!(op.trigger(), expected);
    assert_eq!(op.as_str().parse::<LocalOp>().unwrap(), op);
}
