// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::processor::{PullBatchReport, PullItem, PullOutcome, PullProcessor};
use crate::clock::Clock;
use crate::context::{SyncContext, SyncSettings};
use crate::db::{keys, Database};
use crate::error::{Error, Result};
use crate::mapping::{Mapping, MappingSet};
use crate::notify::Notifier;
use crate::record::{format_remote_datetime, RemoteId, RemoteRecord};
use crate::remote::{RemoteApi, RemoteError};

/// Totals for one [`PullFetcher::fetch_and_process`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRunSummary {
    /// Mappings whose query ran, in processing order.
    pub mappings: Vec<String>,
    pub records: usize,
    pub report: PullBatchReport,
}

/// The changed-records query for `mapping` since `since`.
pub fn build_pull_query(mapping: &Mapping, since: DateTime<Utc>) -> String {
    let trigger = mapping.pull_trigger_date.as_str();
    let mut fields: Vec<&str> = vec!["Id", trigger];
    fields.extend(mapping.get_pull_fields().iter().map(|f| f.salesforce_field()));
    fields.extend(mapping.key.as_deref());
    let mut seen = std::collections::BTreeSet::new();
    fields.retain(|f| seen.insert(*f));

    let mut conditions = vec![format!("{trigger} > {}", format_remote_datetime(since))];
    if let Some(record_type) = &mapping.salesforce_record_type {
        conditions.push(format!("RecordTypeId = '{}'", record_type.replace('\'', "\\'")));
    }
    if let Some(clause) = mapping.pull_where_clause.as_deref().filter(|c| !c.trim().is_empty()) {
        conditions.push(format!("({clause})"));
    }

    format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {trigger} ASC",
        fields.join(", "),
        mapping.salesforce_object_type,
        conditions.join(" AND ")
    )
}

/// Finds changed remote records per mapping and pulls them.
#[derive(Clone, Copy)]
pub struct PullFetcher<'a> {
    db: &'a Database,
    mappings: &'a MappingSet,
    remote: &'a dyn RemoteApi,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
    settings: &'a SyncSettings,
    processor: PullProcessor<'a>,
}

impl<'a> PullFetcher<'a> {
    pub fn from_context(ctx: &SyncContext<'a>) -> Self {
        PullFetcher {
            db: ctx.db,
            mappings: ctx.mappings,
            remote: ctx.remote,
            notifier: ctx.notifier,
            clock: ctx.clock,
            settings: ctx.settings,
            processor: PullProcessor::from_context(ctx),
        }
    }

    /// Pull every due mapping.
    ///
    /// A mapping's checkpoint advances to the newest trigger date seen,
    /// but never past a record that must be retried. An unauthorized
    /// session aborts the run.
    pub fn fetch_and_process(&self) -> Result<PullRunSummary> {
        let mut summary = PullRunSummary::default();
        for mapping in self.mappings.pull_mappings() {
            let now = self.clock.now();
            let last_run_key = keys::pull_last_run(&mapping.id);
            if !mapping.is_pull_due(self.db.get_state_timestamp(&last_run_key)?, now) {
                continue;
            }
            let checkpoint_key = keys::pull_checkpoint(&mapping.id);
            let since = self
                .db
                .get_state_timestamp(&checkpoint_key)?
                .unwrap_or_else(|| self.settings.pull_start(now));

            let records = match self.remote.query(&build_pull_query(mapping, since)) {
                Ok(records) => records,
                Err(RemoteError::Unauthorized) => return Err(RemoteError::Unauthorized.into()),
                Err(e) => {
                    self.notifier.error(
                        Some(&Error::from(e)),
                        "Pull query failed for mapping %mapping.",
                        &[("%mapping", mapping.id.as_str())],
                    );
                    continue;
                }
            };
            tracing::debug!(mapping = %mapping.id, count = records.len(), "fetched changed records");

            summary.mappings.push(mapping.id.clone());
            summary.records += records.len();
            let (report, checkpoint) = self.process_records(mapping, records);
            if let Some(checkpoint) = checkpoint {
                self.db.advance_state_timestamp(&checkpoint_key, checkpoint)?;
            }
            self.db.set_state_timestamp(&last_run_key, now)?;
            summary.report.merge(&report);
        }
        Ok(summary)
    }

    fn process_records(
        &self,
        mapping: &Mapping,
        records: Vec<RemoteRecord>,
    ) -> (PullBatchReport, Option<DateTime<Utc>>) {
        let mut report = PullBatchReport::default();
        let mut newest: Option<DateTime<Utc>> = None;
        let mut blocked: Option<DateTime<Utc>> = None;

        for record in records {
            let updated = record.datetime(&mapping.pull_trigger_date);
            let item = PullItem::new(mapping.id.clone(), record);
            match self.processor.process_item(&item) {
                Ok(outcome) => report.count(outcome),
                Err(e) if e.is_retryable() => {
                    report.retry.push(item.record.id().clone());
                    if let Some(updated) = updated {
                        blocked = Some(blocked.map_or(updated, |b| b.min(updated)));
                    }
                }
                Err(e) => {
                    self.notifier.error(
                        Some(&e),
                        "Failed to pull remote record %sfid.",
                        &[("%sfid", item.record.id().as_str())],
                    );
                    report.count(PullOutcome::Failed);
                }
            }
            if let Some(updated) = updated {
                newest = Some(newest.map_or(updated, |n| n.max(updated)));
            }
        }

        let checkpoint = match blocked {
            Some(blocked) => newest.map(|n| n.min(blocked - Duration::seconds(1))),
            None => newest,
        };
        (report, checkpoint)
    }

    /// Read one remote record and pull it, optionally bypassing the
    /// staleness comparison.
    pub fn pull_record(&self, mapping_id: &str, id: &RemoteId, force: bool) -> Result<PullOutcome> {
        let mapping =
            self.mappings.get(mapping_id).ok_or_else(|| Error::MappingNotFound(mapping_id.to_string()))?;
        let record = self.remote.object_read(&mapping.salesforce_object_type, id)?;
        let mut item = PullItem::new(&mapping.id, record);
        if force {
            item = item.forced();
        }
        self.processor.process_item(&item)
    }
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
