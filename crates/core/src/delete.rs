// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Propagation of remote deletions to local entities.
//!
//! Each remote object type with a mapping keeps its own checkpoint. A pass
//! asks the remote side for deletions since that checkpoint, removes the
//! local entities behind the affected links and then moves the checkpoint
//! forward, whatever the outcome of individual records.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::context::{SyncContext, SyncSettings};
use crate::db::{keys, Database};
use crate::entity::{EntityStore, Origin};
use crate::error::{Error, Result};
use crate::mapped_object::MappedObject;
use crate::mapping::MappingSet;
use crate::notify::Notifier;
use crate::record::{format_remote_datetime, parse_remote_datetime, RemoteId};
use crate::remote::{RemoteApi, RemoteError};
use crate::trigger::SyncTrigger;

/// Narrowest window the remote deletion query accepts.
pub const MIN_WINDOW_SECS: i64 = 60;

/// The query window for a pass starting at `last`.
///
/// The end is `now`, pushed out to `last + 60s` when that is later.
pub fn delete_window(last: DateTime<Utc>, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let min_end = last + Duration::seconds(MIN_WINDOW_SECS);
    (last, now.max(min_end))
}

/// Totals for one [`DeleteHandler::process_deleted_records`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteRunSummary {
    /// Object types whose checkpoint advanced, in processing order.
    pub object_types: Vec<String>,
    pub deleted_records_seen: usize,
    pub entities_deleted: usize,
    /// Links removed because their local entity was already gone.
    pub links_removed: usize,
    /// Links left alone because their mapping no longer exists.
    pub orphaned: usize,
    /// Links left alone because the mapping does not pull deletes.
    pub skipped: usize,
    pub failed: usize,
}

enum LinkOutcome {
    Deleted,
    LinkRemoved,
    Orphaned,
    Skipped,
    Failed,
}

/// Polls remote deletions and removes the linked local entities.
#[derive(Clone, Copy)]
pub struct DeleteHandler<'a> {
    db: &'a Database,
    mappings: &'a MappingSet,
    remote: &'a dyn RemoteApi,
    store: &'a dyn EntityStore,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
    settings: &'a SyncSettings,
}

impl<'a> DeleteHandler<'a> {
    pub fn from_context(ctx: &SyncContext<'a>) -> Self {
        DeleteHandler {
            db: ctx.db,
            mappings: ctx.mappings,
            remote: ctx.remote,
            store: ctx.store,
            notifier: ctx.notifier,
            clock: ctx.clock,
            settings: ctx.settings,
        }
    }

    /// Run one pass over every mapped object type, last declared first.
    ///
    /// A failed deletion query leaves that type's checkpoint untouched;
    /// an unauthorized session aborts the run.
    pub fn process_deleted_records(&self) -> Result<DeleteRunSummary> {
        let mut summary = DeleteRunSummary::default();
        for object_type in self.mappings.mapped_object_types().into_iter().rev() {
            self.process_object_type(object_type, &mut summary)?;
        }
        Ok(summary)
    }

    fn process_object_type(&self, object_type: &str, summary: &mut DeleteRunSummary) -> Result<()> {
        let now = self.clock.now();
        let checkpoint_key = keys::delete_checkpoint(object_type);
        let last = self
            .db
            .get_state_timestamp(&checkpoint_key)?
            .unwrap_or_else(|| self.settings.delete_start(now));
        let (start, end) = delete_window(last, now);
        let (start_str, end_str) = (format_remote_datetime(start), format_remote_datetime(end));

        let deleted = match self.remote.get_deleted(object_type, &start_str, &end_str) {
            Ok(deleted) => deleted,
            Err(RemoteError::Unauthorized) => return Err(RemoteError::Unauthorized.into()),
            Err(e) => {
                self.notifier.error(
                    Some(&Error::from(e)),
                    "Could not fetch deleted %object_type records.",
                    &[("%object_type", object_type)],
                );
                return Ok(());
            }
        };

        if let Some(earliest) = deleted.earliest_date_available.as_deref() {
            if parse_remote_datetime(earliest).is_some_and(|earliest| earliest > start) {
                self.notifier.warning(
                    None,
                    "Deleted %object_type records before %earliest are no longer available.",
                    &[("%object_type", object_type), ("%earliest", earliest)],
                );
            }
        }

        tracing::debug!(
            object_type,
            start = %start_str,
            end = %end_str,
            count = deleted.deleted_records.len(),
            "fetched deleted records"
        );
        for record in &deleted.deleted_records {
            summary.deleted_records_seen += 1;
            let salesforce_id = match RemoteId::parse(&record.id) {
                Ok(id) => id,
                Err(e) => {
                    self.notifier.warning(
                        Some(&e),
                        "Ignoring deleted %object_type record with invalid id %sfid.",
                        &[("%object_type", object_type), ("%sfid", record.id.as_str())],
                    );
                    continue;
                }
            };
            let links = match self.db.find_mapped_objects_by_salesforce_id(&salesforce_id) {
                Ok(links) => links,
                Err(e) => {
                    self.notifier.error(
                        Some(&e),
                        "Could not look up mapped objects for deleted remote record %sfid.",
                        &[("%sfid", salesforce_id.as_str())],
                    );
                    summary.failed += 1;
                    continue;
                }
            };
            for link in &links {
                let outcome = self.handle_link(link).unwrap_or_else(|e| {
                    self.notifier.error(
                        Some(&e),
                        "Could not process mapped object %id for deleted remote record %sfid.",
                        &[("%id", link.id.to_string().as_str()), ("%sfid", salesforce_id.as_str())],
                    );
                    LinkOutcome::Failed
                });
                match outcome {
                    LinkOutcome::Deleted => summary.entities_deleted += 1,
                    LinkOutcome::LinkRemoved => summary.links_removed += 1,
                    LinkOutcome::Orphaned => summary.orphaned += 1,
                    LinkOutcome::Skipped => summary.skipped += 1,
                    LinkOutcome::Failed => summary.failed += 1,
                }
            }
        }

        self.db.advance_state_timestamp(&checkpoint_key, end)?;
        summary.object_types.push(object_type.to_string());
        Ok(())
    }

    /// Applies one deleted record to one link.
    ///
    /// Store and database errors are returned for the caller to report;
    /// they never end the pass.
    fn handle_link(&self, link: &MappedObject) -> Result<LinkOutcome> {
        let sfid = link.salesforce_id.to_string();
        let Some(entity) = self.store.load(&link.entity_type_id, &link.entity_id)? else {
            self.db.delete_mapped_object(link.id)?;
            self.notifier.notice(
                "No local entity for deleted remote record %sfid; removed its mapped object.",
                &[("%sfid", sfid.as_str())],
            );
            return Ok(LinkOutcome::LinkRemoved);
        };

        let Some(mapping) = self.mappings.get(&link.salesforce_mapping) else {
            self.notifier.warning(
                None,
                "Mapped object %id for deleted remote record %sfid uses missing mapping %mapping; left untouched.",
                &[
                    ("%id", link.id.to_string().as_str()),
                    ("%sfid", sfid.as_str()),
                    ("%mapping", link.salesforce_mapping.as_str()),
                ],
            );
            return Ok(LinkOutcome::Orphaned);
        };

        if !mapping.does_crud(&[SyncTrigger::PullDelete]) {
            tracing::debug!(mapping = %mapping.id, sfid = %sfid, "pull delete disabled");
            return Ok(LinkOutcome::Skipped);
        }

        let label = entity.label();
        match self.store.delete(&entity, Origin::RemoteSync) {
            Ok(()) => {
                self.db.delete_mapped_object(link.id)?;
                self.notifier.notice(
                    "Deleted entity %label for deleted remote record %sfid.",
                    &[("%label", label.as_str()), ("%sfid", sfid.as_str())],
                );
                Ok(LinkOutcome::Deleted)
            }
            Err(e) => {
                self.notifier.error(
                    Some(&e),
                    "Failed to delete entity %label for deleted remote record %sfid.",
                    &[("%label", label.as_str()), ("%sfid", sfid.as_str())],
                );
                Ok(LinkOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod tests;
