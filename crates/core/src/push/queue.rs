// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The push queue: enqueue, claim, settle and scheduled processing.

use serde::Serialize;
use serde_json::Value;

use super::item::QueueItem;
use super::processor::{BatchReport, ProcessorRegistry};
use crate::clock::Clock;
use crate::context::{SyncContext, SyncSettings};
use crate::db::{keys, Database};
use crate::error::{Error, ErrorKind, Result};
use crate::mapping::{Mapping, MappingSet};
use crate::notify::Notifier;
use crate::trigger::LocalOp;

/// Which mappings a [`PushQueue::process_queues`] run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushScope {
    /// Scheduled runs: mappings without `push_standalone`.
    Cron,
    /// Standalone runs: mappings with `push_standalone`.
    Standalone,
    All,
}

impl PushScope {
    pub fn includes(&self, mapping: &Mapping) -> bool {
        match self {
            PushScope::Cron => !mapping.push_standalone,
            PushScope::Standalone => mapping.push_standalone,
            PushScope::All => true,
        }
    }
}

/// What [`PushQueue::fail_item`] did with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Back to pending for a later claim.
    Retry,
    /// Removed for good.
    Dropped,
}

/// Totals for one [`PushQueue::process_queues`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushRunSummary {
    /// Mappings whose queue was processed, in processing order.
    pub mappings: Vec<String>,
    pub claimed: usize,
    pub report: BatchReport,
}

/// Durable queue of pending local changes.
#[derive(Clone, Copy)]
pub struct PushQueue<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
    notifier: &'a dyn Notifier,
    settings: &'a SyncSettings,
}

impl<'a> PushQueue<'a> {
    pub fn new(
        db: &'a Database,
        clock: &'a dyn Clock,
        notifier: &'a dyn Notifier,
        settings: &'a SyncSettings,
    ) -> Self {
        PushQueue { db, clock, notifier, settings }
    }

    pub fn from_context(ctx: &SyncContext<'a>) -> Self {
        Self::new(ctx.db, ctx.clock, ctx.notifier, ctx.settings)
    }

    /// Queue a local change for `mapping`.
    ///
    /// Returns `None` when the mapping does not push this kind of change.
    /// A pending item for the same entity absorbs the new change.
    pub fn enqueue(
        &self,
        mapping: &Mapping,
        entity_id: &str,
        op: LocalOp,
        payload: Option<&Value>,
    ) -> Result<Option<i64>> {
        if !mapping.does_crud(&[op.trigger()]) {
            return Ok(None);
        }
        let item_id =
            self.db.upsert_queue_item(&mapping.id, entity_id, op, payload, self.clock.now())?;
        tracing::debug!(mapping = %mapping.id, entity_id, op = %op, item_id, "enqueued push");
        Ok(Some(item_id))
    }

    /// Single-item claims are not supported; claim a batch instead.
    pub fn claim_item(&self) -> Result<QueueItem> {
        Err(Error::SingleClaimUnsupported)
    }

    fn effective_limit(&self, limit: usize) -> usize {
        let ceiling = match self.settings.global_push_limit {
            0 => usize::MAX,
            n => n,
        };
        match limit {
            0 => ceiling,
            n => n.min(ceiling),
        }
    }

    fn claim(&self, mapping_id: Option<&str>, limit: usize) -> Result<Vec<QueueItem>> {
        let now = self.clock.now();
        self.db.claim_queue_items(mapping_id, self.effective_limit(limit), now, now + self.settings.lease)
    }

    /// Lease up to `limit` items across all mappings; 0 means the global ceiling.
    pub fn claim_items(&self, limit: usize) -> Result<Vec<QueueItem>> {
        self.claim(None, limit)
    }

    /// Lease up to `limit` items of one mapping; 0 means the global ceiling.
    pub fn claim_mapping_items(&self, mapping_id: &str, limit: usize) -> Result<Vec<QueueItem>> {
        self.claim(Some(mapping_id), limit)
    }

    /// Settle a successfully pushed item.
    ///
    /// If a newer change was merged in after the claim, the item is released
    /// instead so that change is pushed too. Returns true if it was deleted.
    pub fn delete_item(&self, item: &QueueItem) -> Result<bool> {
        if self.db.delete_queue_item(item.item_id, item.revision)? {
            return Ok(true);
        }
        self.db.release_queue_items(&[item.item_id])?;
        Ok(false)
    }

    /// Give claimed items back without counting a failure.
    pub fn release_items(&self, items: &[QueueItem]) -> Result<usize> {
        let ids: Vec<i64> = items.iter().map(|i| i.item_id).collect();
        self.db.release_queue_items(&ids)
    }

    /// Clear leases that have expired.
    pub fn release_expired(&self) -> Result<usize> {
        self.db.release_expired_queue_items(self.clock.now())
    }

    /// Record a failed push.
    ///
    /// The item is dropped when `push_retries` is non-zero and the new fail
    /// count exceeds it; otherwise it returns to pending.
    pub fn fail_item(&self, mapping: &Mapping, item: &QueueItem, error: &Error) -> Result<FailOutcome> {
        let item_id = item.item_id.to_string();
        let Some(fail_count) = self.db.fail_queue_item(item.item_id, self.clock.now())? else {
            return Ok(FailOutcome::Dropped);
        };
        let count = fail_count.to_string();
        if mapping.push_retries != 0 && fail_count > mapping.push_retries {
            self.db.remove_queue_item(item.item_id)?;
            self.notifier.error(
                Some(error),
                "Dropped push queue item %item for %entity_type %entity after %count failures.",
                &[
                    ("%item", item_id.as_str()),
                    ("%entity_type", mapping.drupal_entity_type.as_str()),
                    ("%entity", item.entity_id.as_str()),
                    ("%count", count.as_str()),
                ],
            );
            return Ok(FailOutcome::Dropped);
        }
        self.notifier.warning(
            Some(error),
            "Push queue item %item for %entity_type %entity failed (attempt %count).",
            &[
                ("%item", item_id.as_str()),
                ("%entity_type", mapping.drupal_entity_type.as_str()),
                ("%entity", item.entity_id.as_str()),
                ("%count", count.as_str()),
            ],
        );
        Ok(FailOutcome::Retry)
    }

    /// Remove an item that can never succeed.
    pub fn drop_item(&self, mapping: &Mapping, item: &QueueItem, error: &Error) -> Result<FailOutcome> {
        self.db.remove_queue_item(item.item_id)?;
        self.notifier.error(
            Some(error),
            "Dropped push queue item %item for %entity_type %entity.",
            &[
                ("%item", item.item_id.to_string().as_str()),
                ("%entity_type", mapping.drupal_entity_type.as_str()),
                ("%entity", item.entity_id.as_str()),
            ],
        );
        Ok(FailOutcome::Dropped)
    }

    /// Settle a failed item: terminal errors drop it, the rest count a retry.
    pub fn settle_failure(
        &self,
        mapping: &Mapping,
        item: &QueueItem,
        error: &Error,
    ) -> Result<FailOutcome> {
        match error.kind() {
            ErrorKind::NotFound | ErrorKind::Configuration => self.drop_item(mapping, item, error),
            _ => self.fail_item(mapping, item, error),
        }
    }

    /// Process every due push mapping in `scope`, lowest weight first.
    ///
    /// Each mapping claims up to its `push_limit` within what remains of the
    /// global ceiling. A batch-fatal error releases the batch and aborts the
    /// run with that error.
    pub fn process_queues(
        &self,
        mappings: &MappingSet,
        processors: &ProcessorRegistry<'_>,
        scope: PushScope,
    ) -> Result<PushRunSummary> {
        let mut summary = PushRunSummary::default();
        let mut remaining = self.effective_limit(0);

        for mapping in mappings.push_mappings() {
            if !scope.includes(mapping) {
                continue;
            }
            if remaining == 0 {
                tracing::debug!("global push ceiling reached");
                break;
            }
            let now = self.clock.now();
            let last_run_key = keys::push_last_run(&mapping.id);
            if !mapping.is_push_due(self.db.get_state_timestamp(&last_run_key)?, now) {
                continue;
            }
            let Some(processor) = processors.get(&mapping.push_processor) else {
                self.notifier.error(
                    None,
                    "No push processor %processor for mapping %mapping.",
                    &[("%processor", mapping.push_processor.as_str()), ("%mapping", mapping.id.as_str())],
                );
                continue;
            };

            let limit = match mapping.push_limit {
                0 => remaining,
                n => n.min(remaining),
            };
            let items = self.claim_mapping_items(&mapping.id, limit)?;
            self.db.set_state_timestamp(&last_run_key, now)?;
            summary.mappings.push(mapping.id.clone());
            if items.is_empty() {
                continue;
            }
            remaining = remaining.saturating_sub(items.len());
            summary.claimed += items.len();

            match processor.process(self, mapping, &items) {
                Ok(report) => summary.report.merge(&report),
                Err(e) if e.is_batch_fatal() => {
                    self.release_items(&items)?;
                    self.notifier.error(
                        Some(&e),
                        "Push for mapping %mapping aborted; %count items released.",
                        &[("%mapping", mapping.id.as_str()), ("%count", items.len().to_string().as_str())],
                    );
                    return Err(e);
                }
                Err(e) => {
                    self.release_items(&items)?;
                    self.notifier.error(
                        Some(&e),
                        "Push processor failed for mapping %mapping.",
                        &[("%mapping", mapping.id.as_str())],
                    );
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
