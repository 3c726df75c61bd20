// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Change capture: the hook the local store calls on every entity write.

use serde::Serialize;

use super::processor::ProcessorRegistry;
use super::queue::PushQueue;
use crate::entity::{Entity, Origin};
use crate::error::{Error, Result};
use crate::mapping::{Mapping, MappingSet};
use crate::notify::Notifier;
use crate::trigger::LocalOp;

/// What happened to a captured change for one mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "item_id")]
pub enum CaptureOutcome {
    /// Pushed synchronously.
    Pushed,
    /// Left in the queue under this item id.
    Queued(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Captured {
    pub mapping_id: String,
    pub outcome: CaptureOutcome,
}

/// Routes local writes to the push side.
pub struct ChangeCapture<'a> {
    mappings: &'a MappingSet,
    queue: &'a PushQueue<'a>,
    processors: &'a ProcessorRegistry<'a>,
    notifier: &'a dyn Notifier,
}

impl<'a> ChangeCapture<'a> {
    pub fn new(
        mappings: &'a MappingSet,
        queue: &'a PushQueue<'a>,
        processors: &'a ProcessorRegistry<'a>,
        notifier: &'a dyn Notifier,
    ) -> Self {
        ChangeCapture { mappings, queue, processors, notifier }
    }

    /// Handle one local write of `entity`.
    ///
    /// Writes made by the pull side are ignored. Async mappings always
    /// enqueue; the rest push now and enqueue only if that fails.
    pub fn capture(&self, entity: &Entity, op: LocalOp, origin: Origin) -> Result<Vec<Captured>> {
        if origin == Origin::RemoteSync {
            tracing::trace!(entity = %entity.label(), "skipping capture of remote sync write");
            return Ok(Vec::new());
        }
        let Some(entity_id) = entity.id.as_deref() else {
            return Err(Error::InvalidInput(format!("cannot capture unsaved {}", entity.label())));
        };

        let mut captured = Vec::new();
        for mapping in self.mappings.for_entity(&entity.entity_type, &entity.bundle) {
            if !mapping.does_crud(&[op.trigger()]) {
                continue;
            }
            let outcome = if mapping.is_async {
                self.enqueue(mapping, entity_id, op)?
            } else {
                self.push_now(mapping, entity_id, op)?
            };
            if let Some(outcome) = outcome {
                captured.push(Captured { mapping_id: mapping.id.clone(), outcome });
            }
        }
        Ok(captured)
    }

    fn enqueue(&self, mapping: &Mapping, entity_id: &str, op: LocalOp) -> Result<Option<CaptureOutcome>> {
        Ok(self.queue.enqueue(mapping, entity_id, op, None)?.map(CaptureOutcome::Queued))
    }

    fn push_now(&self, mapping: &Mapping, entity_id: &str, op: LocalOp) -> Result<Option<CaptureOutcome>> {
        let Some(processor) = self.processors.get(&mapping.push_processor) else {
            self.notifier.warning(
                None,
                "No push processor %processor for mapping %mapping; queued %entity instead.",
                &[
                    ("%processor", mapping.push_processor.as_str()),
                    ("%mapping", mapping.id.as_str()),
                    ("%entity", entity_id),
                ],
            );
            return self.enqueue(mapping, entity_id, op);
        };
        match processor.push_entity(mapping, entity_id, op) {
            Ok(()) => Ok(Some(CaptureOutcome::Pushed)),
            Err(e) => {
                self.notifier.warning(
                    Some(&e),
                    "Immediate push of %entity for mapping %mapping failed; queued for retry.",
                    &[("%entity", entity_id), ("%mapping", mapping.id.as_str())],
                );
                self.enqueue(mapping, entity_id, op)
            }
        }
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
