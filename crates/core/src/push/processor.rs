// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push processors: the plugins that turn queue items into remote writes.

use serde::Serialize;
use std::collections::BTreeMap;

use super::item::QueueItem;
use super::queue::{FailOutcome, PushQueue};
use crate::clock::Clock;
use crate::context::SyncContext;
use crate::db::Database;
use crate::entity::EntityStore;
use crate::error::{Error, Result};
use crate::mapped_object::{MappedObject, SyncAction};
use crate::mapping::Mapping;
use crate::notify::Notifier;
use crate::record::RemoteId;
use crate::remote::{RemoteApi, RemoteError};
use crate::trigger::LocalOp;

/// Per-batch outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub retried: usize,
    pub dropped: usize,
}

impl BatchReport {
    pub fn merge(&mut self, other: &BatchReport) {
        self.succeeded += other.succeeded;
        self.retried += other.retried;
        self.dropped += other.dropped;
    }

    fn count(&mut self, outcome: FailOutcome) {
        match outcome {
            FailOutcome::Retry => self.retried += 1,
            FailOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// A push plugin selected by a mapping's `push_processor` name.
pub trait PushProcessor {
    /// Push a claimed batch, settling every item through `queue`.
    ///
    /// A batch-fatal error must be returned before any item is deleted so
    /// the caller can release the whole batch.
    fn process(&self, queue: &PushQueue<'_>, mapping: &Mapping, items: &[QueueItem])
        -> Result<BatchReport>;

    /// Push one local change immediately, outside the queue.
    fn push_entity(&self, mapping: &Mapping, entity_id: &str, op: LocalOp) -> Result<()>;
}

/// Named push processors.
#[derive(Default)]
pub struct ProcessorRegistry<'a> {
    processors: BTreeMap<String, Box<dyn PushProcessor + 'a>>,
}

impl<'a> ProcessorRegistry<'a> {
    pub fn new() -> Self {
        ProcessorRegistry { processors: BTreeMap::new() }
    }

    /// Register `processor` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, processor: impl PushProcessor + 'a) {
        self.processors.insert(name.into(), Box::new(processor));
    }

    pub fn with(mut self, name: impl Into<String>, processor: impl PushProcessor + 'a) -> Self {
        self.register(name, processor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn PushProcessor> {
        self.processors.get(name).map(|p| p.as_ref() as &dyn PushProcessor)
    }

    pub fn names(&self) -> Vec<&str> {
        self.processors.keys().map(String::as_str).collect()
    }
}

/// The default processor: one remote REST call per item.
#[derive(Clone, Copy)]
pub struct RestProcessor<'a> {
    db: &'a Database,
    remote: &'a dyn RemoteApi,
    store: &'a dyn EntityStore,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
}

impl<'a> RestProcessor<'a> {
    pub const NAME: &'static str = "rest";

    pub fn new(
        db: &'a Database,
        remote: &'a dyn RemoteApi,
        store: &'a dyn EntityStore,
        notifier: &'a dyn Notifier,
        clock: &'a dyn Clock,
    ) -> Self {
        RestProcessor { db, remote, store, notifier, clock }
    }

    pub fn from_context(ctx: &SyncContext<'a>) -> Self {
        Self::new(ctx.db, ctx.remote, ctx.store, ctx.notifier, ctx.clock)
    }

    fn push_delete(&self, mapping: &Mapping, link: Option<MappedObject>) -> Result<()> {
        let Some(link) = link else {
            tracing::debug!(mapping = %mapping.id, "delete of unlinked entity, nothing to push");
            return Ok(());
        };
        match self.remote.object_delete(&mapping.salesforce_object_type, &link.salesforce_id) {
            Ok(()) => {}
            Err(RemoteError::NotFound(_)) => {
                tracing::debug!(salesforce_id = %link.salesforce_id, "remote record already deleted");
            }
            Err(e) => return Err(self.record_failure(link, e.into())),
        }
        self.db.delete_mapped_object(link.id)?;
        self.notifier.notice(
            "Deleted %object_type %sfid for %entity_type %entity.",
            &[
                ("%object_type", mapping.salesforce_object_type.as_str()),
                ("%sfid", link.salesforce_id.as_str()),
                ("%entity_type", link.entity_type_id.as_str()),
                ("%entity", link.entity_id.as_str()),
            ],
        );
        Ok(())
    }

    fn push_upsert(
        &self,
        mapping: &Mapping,
        entity_id: &str,
        link: Option<MappedObject>,
    ) -> Result<()> {
        let entity = match self.store.load(&mapping.drupal_entity_type, entity_id) {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                let err = Error::EntityNotFound {
                    entity_type: mapping.drupal_entity_type.clone(),
                    entity_id: entity_id.to_string(),
                };
                return Err(self.fail_link(link, err));
            }
            Err(e) => return Err(self.fail_link(link, e)),
        };
        let params = mapping.get_push_params(&entity);

        let result: Result<RemoteId> = match (&mapping.key, &link) {
            (Some(key), _) => match mapping.get_key_value(&entity) {
                Ok(Some(value)) => self
                    .remote
                    .object_upsert(&mapping.salesforce_object_type, key, &value, &params)
                    .map_err(Error::from),
                Ok(None) => Err(Error::KeyValueMissing { mapping: mapping.id.clone(), key: key.clone() }),
                Err(e) => Err(e),
            },
            (None, Some(link)) => self
                .remote
                .object_update(&mapping.salesforce_object_type, &link.salesforce_id, &params)
                .map(|()| link.salesforce_id.clone())
                .map_err(Error::from),
            (None, None) => self
                .remote
                .object_create(&mapping.salesforce_object_type, &params)
                .map_err(Error::from),
        };

        let salesforce_id = match result {
            Ok(id) => id,
            Err(e) => return Err(self.fail_link(link, e)),
        };

        let now = self.clock.now();
        let entity_updated = entity.changed.unwrap_or(now);
        match link {
            Some(mut link) => {
                link.salesforce_id = salesforce_id;
                link.record_success(SyncAction::Push, entity_updated, now);
                self.db.update_mapped_object(&link)?;
            }
            None => {
                let mut link = MappedObject::new(
                    &mapping.drupal_entity_type,
                    entity_id,
                    salesforce_id,
                    &mapping.id,
                    SyncAction::Push,
                    now,
                );
                link.entity_updated = Some(entity_updated);
                self.db.create_mapped_object(&link)?;
            }
        }
        tracing::debug!(mapping = %mapping.id, entity_id, "pushed entity");
        Ok(())
    }

    fn fail_link(&self, link: Option<MappedObject>, err: Error) -> Error {
        match link {
            Some(link) => self.record_failure(link, err),
            None => err,
        }
    }

    /// Mark the link as failed and hand the error back.
    fn record_failure(&self, mut link: MappedObject, err: Error) -> Error {
        link.record_failure(SyncAction::Push, err.to_string(), self.clock.now());
        if let Err(e) = self.db.update_mapped_object(&link) {
            self.notifier.error(
                Some(&e),
                "Could not record push failure on link %link.",
                &[("%link", link.id.to_string().as_str())],
            );
        }
        err
    }
}

impl PushProcessor for RestProcessor<'_> {
    fn process(
        &self,
        queue: &PushQueue<'_>,
        mapping: &Mapping,
        items: &[QueueItem],
    ) -> Result<BatchReport> {
        if !self.remote.is_authorized() {
            return Err(RemoteError::Unauthorized.into());
        }
        let mut report = BatchReport::default();
        for (idx, item) in items.iter().enumerate() {
            match self.push_entity(mapping, &item.entity_id, item.op) {
                Ok(()) => {
                    queue.delete_item(item)?;
                    report.succeeded += 1;
                }
                Err(e) if e.is_batch_fatal() => {
                    queue.release_items(&items[idx..])?;
                    return Err(e);
                }
                Err(e) => report.count(queue.settle_failure(mapping, item, &e)?),
            }
        }
        Ok(report)
    }

    fn push_entity(&self, mapping: &Mapping, entity_id: &str, op: LocalOp) -> Result<()> {
        let link = self.db.find_mapped_object_for_entity(
            &mapping.drupal_entity_type,
            entity_id,
            &mapping.id,
        )?;
        match op {
            LocalOp::Delete => self.push_delete(mapping, link),
            LocalOp::Create | LocalOp::Update => self.push_upsert(mapping, entity_id, link),
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
