// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::context::SyncContext;
use crate::db::Database;
use crate::entity::{Entity, EntityStore, Origin};
use crate::error::{Error, Result};
use crate::mapped_object::{MappedObject, SyncAction};
use crate::mapping::{Mapping, MappingSet, PushParams};
use crate::notify::Notifier;
use crate::record::{RemoteId, RemoteRecord};
use crate::remote::RemoteApi;
use crate::trigger::SyncTrigger;

/// One changed remote record to reconcile.
#[derive(Debug, Clone, PartialEq)]
pub struct PullItem {
    pub mapping_id: String,
    pub record: RemoteRecord,
    /// Apply values even when the remote copy is not newer.
    pub force_pull: bool,
}

impl PullItem {
    pub fn new(mapping_id: impl Into<String>, record: RemoteRecord) -> Self {
        PullItem { mapping_id: mapping_id.into(), record, force_pull: false }
    }

    pub fn forced(mut self) -> Self {
        self.force_pull = true;
        self
    }
}

/// How a pull item was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PullOutcome {
    Created,
    Updated,
    /// Linked, but the remote copy was not newer.
    Unchanged,
    /// The mapping is missing or does not allow this pull.
    Skipped,
    /// A terminal failure; already reported.
    Failed,
    /// Another runner linked the record first.
    Duplicate,
}

/// Totals for a batch of pull items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullBatchReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duplicate: usize,
    /// Records whose work must be attempted again.
    pub retry: Vec<RemoteId>,
}

impl PullBatchReport {
    pub fn count(&mut self, outcome: PullOutcome) {
        match outcome {
            PullOutcome::Created => self.created += 1,
            PullOutcome::Updated => self.updated += 1,
            PullOutcome::Unchanged => self.unchanged += 1,
            PullOutcome::Skipped => self.skipped += 1,
            PullOutcome::Failed => self.failed += 1,
            PullOutcome::Duplicate => self.duplicate += 1,
        }
    }

    pub fn merge(&mut self, other: &PullBatchReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.duplicate += other.duplicate;
        self.retry.extend(other.retry.iter().cloned());
    }
}

/// Remote wins only when it is strictly newer. A local side that was never
/// stamped loses; a remote side without a date never wins.
fn remote_is_newer(remote: Option<DateTime<Utc>>, local: Option<DateTime<Utc>>) -> bool {
    match (remote, local) {
        (Some(remote), Some(local)) => remote > local,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Per-record reconciliation of remote changes.
#[derive(Clone, Copy)]
pub struct PullProcessor<'a> {
    db: &'a Database,
    mappings: &'a MappingSet,
    remote: &'a dyn RemoteApi,
    store: &'a dyn EntityStore,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
}

impl<'a> PullProcessor<'a> {
    pub fn new(
        db: &'a Database,
        mappings: &'a MappingSet,
        remote: &'a dyn RemoteApi,
        store: &'a dyn EntityStore,
        notifier: &'a dyn Notifier,
        clock: &'a dyn Clock,
    ) -> Self {
        PullProcessor { db, mappings, remote, store, notifier, clock }
    }

    pub fn from_context(ctx: &SyncContext<'a>) -> Self {
        Self::new(ctx.db, ctx.mappings, ctx.remote, ctx.store, ctx.notifier, ctx.clock)
    }

    /// Reconcile one record.
    ///
    /// Terminal failures are reported and settle as [`PullOutcome::Failed`].
    /// A failed key write-back returns [`Error::PullRetry`] so the caller
    /// keeps the record for another attempt.
    pub fn process_item(&self, item: &PullItem) -> Result<PullOutcome> {
        let Some(mapping) = self.mappings.get(&item.mapping_id) else {
            self.notifier.warning(
                None,
                "Pulled remote record %sfid for unknown mapping %mapping.",
                &[("%sfid", item.record.id().as_str()), ("%mapping", item.mapping_id.as_str())],
            );
            return Ok(PullOutcome::Skipped);
        };

        let record = &item.record;
        let result = match self.db.find_mapped_object(record.id(), &mapping.id)? {
            Some(link) => self.update_entity(mapping, link, record, item.force_pull),
            None => self.create_entity(mapping, record),
        };
        match result {
            Ok(outcome) => Ok(outcome),
            Err(e @ Error::PullRetry { .. }) => {
                self.notifier.error(
                    Some(&e),
                    "Pull of remote record %sfid will be retried.",
                    &[("%sfid", record.id().as_str())],
                );
                Err(e)
            }
            Err(e) => {
                self.notifier.error(
                    Some(&e),
                    "Failed to pull remote record %sfid for mapping %mapping.",
                    &[("%sfid", record.id().as_str()), ("%mapping", mapping.id.as_str())],
                );
                Ok(PullOutcome::Failed)
            }
        }
    }

    /// Reconcile a batch; retryable records are listed in the report.
    pub fn process_batch(&self, items: &[PullItem]) -> PullBatchReport {
        let mut report = PullBatchReport::default();
        for item in items {
            match self.process_item(item) {
                Ok(outcome) => report.count(outcome),
                Err(e) if e.is_retryable() => report.retry.push(item.record.id().clone()),
                Err(e) => {
                    self.notifier.error(
                        Some(&e),
                        "Failed to pull remote record %sfid.",
                        &[("%sfid", item.record.id().as_str())],
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn update_entity(
        &self,
        mapping: &Mapping,
        mut link: MappedObject,
        record: &RemoteRecord,
        force: bool,
    ) -> Result<PullOutcome> {
        if !mapping.does_crud(&[SyncTrigger::PullUpdate]) {
            tracing::debug!(mapping = %mapping.id, sfid = %record.id(), "pull update disabled");
            return Ok(PullOutcome::Skipped);
        }
        let Some(mut entity) = self.store.load(&link.entity_type_id, &link.entity_id)? else {
            self.notifier.error(
                None,
                "Local entity existed at one time for remote record %sfid, but does not currently exist.",
                &[("%sfid", record.id().as_str())],
            );
            return Ok(PullOutcome::Failed);
        };

        let local_updated = entity.changed.or(link.entity_updated);
        let remote_updated = record.datetime(&mapping.pull_trigger_date);

        self.write_back_key(mapping, &entity, record)?;

        if !(remote_is_newer(remote_updated, local_updated) || force || link.force_pull) {
            tracing::debug!(mapping = %mapping.id, sfid = %record.id(), "remote copy not newer");
            return Ok(PullOutcome::Unchanged);
        }

        self.apply_fields(mapping, &mut entity, record);
        self.store.save(&mut entity, Origin::RemoteSync)?;
        let now = self.clock.now();
        link.record_success(SyncAction::Pull, entity.changed.unwrap_or(now), now);
        self.db.update_mapped_object(&link)?;

        self.notifier.notice(
            "Updated entity %label associated with remote record %sfid.",
            &[("%label", entity.label().as_str()), ("%sfid", record.id().as_str())],
        );
        Ok(PullOutcome::Updated)
    }

    fn create_entity(&self, mapping: &Mapping, record: &RemoteRecord) -> Result<PullOutcome> {
        if !mapping.does_crud(&[SyncTrigger::PullCreate]) {
            tracing::debug!(mapping = %mapping.id, sfid = %record.id(), "pull create disabled");
            return Ok(PullOutcome::Skipped);
        }

        let mut entity = Entity::new(&mapping.drupal_entity_type, &mapping.drupal_bundle);
        self.apply_fields(mapping, &mut entity, record);
        self.store.save(&mut entity, Origin::RemoteSync)?;
        let entity_id = entity
            .id
            .clone()
            .ok_or_else(|| Error::EntityStore(format!("no id assigned to new {}", entity.label())))?;

        let now = self.clock.now();
        let mut link = MappedObject::new(
            &mapping.drupal_entity_type,
            &entity_id,
            record.id().clone(),
            &mapping.id,
            SyncAction::Pull,
            now,
        );
        link.entity_updated = Some(entity.changed.unwrap_or(now));
        match self.db.create_mapped_object(&link) {
            Ok(_) => {}
            Err(e @ Error::DuplicateLink { .. }) => {
                if let Err(del) = self.store.delete(&entity, Origin::RemoteSync) {
                    self.notifier.error(
                        Some(&del),
                        "Could not discard duplicate entity %label.",
                        &[("%label", entity.label().as_str())],
                    );
                }
                self.notifier.warning(
                    Some(&e),
                    "Remote record %sfid was linked by another run; discarded %label.",
                    &[("%sfid", record.id().as_str()), ("%label", entity.label().as_str())],
                );
                return Ok(PullOutcome::Duplicate);
            }
            Err(e) => return Err(e),
        }

        self.write_back_key(mapping, &entity, record)?;

        self.notifier.notice(
            "Created entity %id %label associated with remote record %sfid.",
            &[
                ("%id", entity_id.as_str()),
                ("%label", entity.label().as_str()),
                ("%sfid", record.id().as_str()),
            ],
        );
        Ok(PullOutcome::Created)
    }

    fn apply_fields(&self, mapping: &Mapping, entity: &mut Entity, record: &RemoteRecord) {
        for field in mapping.get_pull_fields() {
            let Some(value) = record.field(field.salesforce_field()) else {
                continue;
            };
            if let Err(e) = field.set_value(entity, value.clone()) {
                self.notifier.warning(
                    Some(&e),
                    "Could not pull %field into %label.",
                    &[("%field", field.salesforce_field()), ("%label", entity.label().as_str())],
                );
            }
        }
    }

    /// Send the local key value to a remote record that lacks it.
    fn write_back_key(&self, mapping: &Mapping, entity: &Entity, record: &RemoteRecord) -> Result<()> {
        let Some(key) = mapping.key.as_deref() else {
            return Ok(());
        };
        if !mapping.does_crud(&[SyncTrigger::PushCreate, SyncTrigger::PushUpdate]) || record.has_value(key) {
            return Ok(());
        }
        let Some(value) = mapping.get_key_value(entity)? else {
            tracing::debug!(mapping = %mapping.id, key, "no local key value to write back");
            return Ok(());
        };
        self.remote
            .object_update(&mapping.salesforce_object_type, record.id(), &PushParams::single(key, value))
            .map_err(|source| Error::PullRetry { salesforce_id: record.id().to_string(), source })?;
        tracing::debug!(mapping = %mapping.id, sfid = %record.id(), key, "wrote key back");
        Ok(())
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
