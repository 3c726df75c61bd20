// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::field::FieldMapping;
use crate::notify::Severity;
use crate::test_helpers::{contact_mapping, sfid, t0, Fixture, RemoteCall};
use crate::trigger::{SyncTrigger, TriggerSet};
use chrono::TimeZone;

fn contact(n: u32, modified: &str) -> RemoteRecord {
    RemoteRecord::new(sfid(n), "Contact")
        .with_field("Email", format!("user{n}@example.com"))
        .with_field("LastModifiedDate", modified)
}

fn fetcher(fx: &Fixture) -> PullFetcher<'_> {
    PullFetcher::from_context(&fx.ctx())
}

fn queries(fx: &Fixture) -> Vec<String> {
    fx.remote
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            RemoteCall::Query(q) => Some(q),
            _ => None,
        })
        .collect()
}

#[test]
fn query_selects_pull_fields_since_checkpoint() {
    let query = build_pull_query(&contact_mapping(), t0());
    assert_eq!(
        query,
        "SELECT Id, LastModifiedDate, Email, LastName FROM Contact \
         WHERE LastModifiedDate > 2024-04-01T09:00:00Z ORDER BY LastModifiedDate ASC"
    );
}

#[test]
fn query_adds_key_record_type_and_clause() {
    let mut mapping = contact_mapping()
        .with_field(FieldMapping::entity_id("Drupal_Id__c"))
        .with_key(Some("Drupal_Id__c"));
    mapping.salesforce_record_type = Some("012000000000001AAA".to_string());
    mapping.pull_where_clause = Some("Email != null".to_string());

    let query = build_pull_query(&mapping, t0());

    assert!(query.starts_with("SELECT Id, LastModifiedDate, Email, LastName, Drupal_Id__c FROM Contact"));
    assert!(query.contains("AND RecordTypeId = '012000000000001AAA'"));
    assert!(query.contains("AND (Email != null)"));
}

#[test]
fn query_deduplicates_fields() {
    let mapping = contact_mapping().with_field(FieldMapping::property("changed", "LastModifiedDate"));
    let query = build_pull_query(&mapping, t0());
    assert!(query.starts_with("SELECT Id, LastModifiedDate, Email, LastName FROM Contact"));
}

#[test]
fn first_run_looks_back_and_advances_checkpoint() {
    let fx = Fixture::new(vec![contact_mapping()]);
    fx.remote.set_query_results(vec![
        contact(1, "2024-03-20T08:00:00.000+0000"),
        contact(2, "2024-03-25T08:00:00.000+0000"),
    ]);

    let summary = fetcher(&fx).fetch_and_process().unwrap();

    assert_eq!(summary.mappings, vec!["contacts"]);
    assert_eq!(summary.records, 2);
    assert_eq!(summary.report.created, 2);
    assert!(queries(&fx)[0].contains("LastModifiedDate > 2024-03-03T09:00:00Z"));
    assert_eq!(
        fx.db.get_state_timestamp(&keys::pull_checkpoint("contacts")).unwrap(),
        Some(Utc.with_ymd_and_hms(2024, 3, 25, 8, 0, 0).unwrap())
    );
    assert_eq!(fx.db.get_state_timestamp(&keys::pull_last_run("contacts")).unwrap(), Some(t0()));
}

#[test]
fn later_runs_query_from_checkpoint() {
    let fx = Fixture::new(vec![contact_mapping()]);
    let checkpoint = Utc.with_ymd_and_hms(2024, 3, 30, 0, 0, 0).unwrap();
    fx.db.set_state_timestamp(&keys::pull_checkpoint("contacts"), checkpoint).unwrap();

    fetcher(&fx).fetch_and_process().unwrap();

    assert!(queries(&fx)[0].contains("LastModifiedDate > 2024-03-30T00:00:00Z"));
    assert_eq!(fx.db.get_state_timestamp(&keys::pull_checkpoint("contacts")).unwrap(), Some(checkpoint));
}

#[test]
fn retryable_record_holds_checkpoint_back() {
    let fx = Fixture::new(vec![contact_mapping()
        .with_field(FieldMapping::entity_id("Drupal_Id__c"))
        .with_key(Some("Drupal_Id__c"))]);
    fx.remote.set_query_results(vec![
        contact(1, "2024-03-20T08:00:00.000+0000"),
        contact(2, "2024-03-25T08:00:00.000+0000"),
    ]);
    fx.remote.fail_update(Some(RemoteError::Timeout));

    let summary = fetcher(&fx).fetch_and_process().unwrap();

    assert_eq!(summary.report.retry, vec![sfid(1), sfid(2)]);
    assert_eq!(
        fx.db.get_state_timestamp(&keys::pull_checkpoint("contacts")).unwrap(),
        Some(Utc.with_ymd_and_hms(2024, 3, 20, 7, 59, 59).unwrap())
    );
}

#[test]
fn mapping_not_due_is_skipped() {
    let fx = Fixture::new(vec![contact_mapping().with_pull_frequency(300)]);
    fx.db.set_state_timestamp(&keys::pull_last_run("contacts"), t0()).unwrap();
    fx.clock.advance(chrono::Duration::seconds(299));

    let summary = fetcher(&fx).fetch_and_process().unwrap();

    assert!(summary.mappings.is_empty());
    assert!(queries(&fx).is_empty());
}

#[test]
fn push_only_mapping_is_not_pulled() {
    let mapping = contact_mapping().with_triggers(TriggerSet::new().with(SyncTrigger::PushCreate));
    let fx = Fixture::new(vec![mapping]);
    fetcher(&fx).fetch_and_process().unwrap();
    assert!(queries(&fx).is_empty());
}

#[test]
fn query_failure_is_reported_and_skipped() {
    let fx = Fixture::new(vec![contact_mapping()]);
    fx.remote.fail_query(Some(RemoteError::from_status(500, "down")));

    let summary = fetcher(&fx).fetch_and_process().unwrap();

    assert!(summary.mappings.is_empty());
    assert!(fx.notifier.contains(Severity::Error, "Pull query failed for mapping contacts"));
    assert_eq!(fx.db.get_state(&keys::pull_checkpoint("contacts")).unwrap(), None);
}

#[test]
fn unauthorized_aborts_run() {
    let fx = Fixture::new(vec![contact_mapping()]);
    fx.remote.fail_query(Some(RemoteError::Unauthorized));
    let err = fetcher(&fx).fetch_and_process().unwrap_err();
    assert!(err.is_batch_fatal());
}

#[test]
fn pull_record_reads_and_forces() {
    let fx = Fixture::new(vec![contact_mapping()]);
    fx.remote.set_query_results(vec![contact(1, "2023-01-01T00:00:00.000+0000")]);

    assert_eq!(fetcher(&fx).pull_record("contacts", &sfid(1), false).unwrap(), PullOutcome::Created);
    assert_eq!(fetcher(&fx).pull_record("contacts", &sfid(1), false).unwrap(), PullOutcome::Unchanged);
    assert_eq!(fetcher(&fx).pull_record("contacts", &sfid(1), true).unwrap(), PullOutcome::Updated);
    assert!(matches!(fx.remote.calls()[0], RemoteCall::Read { .. }));
}

#[test]
fn pull_record_unknown_mapping() {
    let fx = Fixture::new(vec![contact_mapping()]);
    let err = fetcher(&fx).pull_record("leads", &sfid(1), false).unwrap_err();
    assert!(matches!(err, Error::MappingNotFound(_)));
}
