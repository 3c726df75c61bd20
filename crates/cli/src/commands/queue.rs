// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sfsync_core::{
    Clock, Database, Error as CoreError, LocalOp, MappingSet, PushQueue, QueueItem, SystemClock,
    TracingNotifier,
};

use crate::cli::{OutputFormat, QueueCommand};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::schema::{QueueItemJson, QueueOutputJson};

use super::{open_db, open_mappings, print_json};

pub fn run(config: &Config, cmd: QueueCommand) -> Result<()> {
    let db = open_db(config)?;
    let clock = SystemClock;
    match cmd {
        QueueCommand::List { mapping, output } => list(&db, mapping.as_deref(), output, clock.now()),
        QueueCommand::Enqueue { mapping, entity_id, op, payload } => {
            let mappings = open_mappings(config)?;
            let notifier = TracingNotifier::new(config.log_level);
            let settings = config.settings();
            let queue = PushQueue::new(&db, &clock, &notifier, &settings);
            let item_id = enqueue(&queue, &mappings, &mapping, &entity_id, &op, payload.as_deref())?;
            println!("Queued {op} of {entity_id} for {mapping} as item {item_id}");
            Ok(())
        }
        QueueCommand::Release { all } => {
            let released = release(&db, all, clock.now())?;
            println!("Released {released} lease(s)");
            Ok(())
        }
        QueueCommand::Remove { item_id } => {
            remove(&db, item_id)?;
            println!("Removed item {item_id}");
            Ok(())
        }
        QueueCommand::Purge { mapping } => {
            let purged = db.purge_queue(mapping.as_deref())?;
            tracing::info!(mapping = mapping.as_deref().unwrap_or("*"), purged, "purged push queue");
            println!("Removed {purged} item(s)");
            Ok(())
        }
    }
}

pub(crate) fn format_item(item: &QueueItem, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{:>6}  {:<8} {} {} (rev {}, {} failure(s))",
        item.item_id,
        item.op.as_str(),
        item.mapping_id,
        item.entity_id,
        item.revision,
        item.fail_count
    );
    if item.is_claimed(now) {
        line.push_str(" [claimed]");
    }
    line
}

fn list(db: &Database, mapping: Option<&str>, output: OutputFormat, now: DateTime<Utc>) -> Result<()> {
    let items = db.list_queue_items(mapping)?;
    match output {
        OutputFormat::Json => print_json(&QueueOutputJson {
            items: items.iter().map(|i| QueueItemJson::new(i, now)).collect(),
        }),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("Queue is empty");
            }
            for item in &items {
                println!("{}", format_item(item, now));
            }
            Ok(())
        }
    }
}

fn parse_payload(payload: Option<&str>) -> Result<Option<Value>> {
    payload
        .map(|p| serde_json::from_str(p).map_err(|e| Error::InvalidPayload(e.to_string())))
        .transpose()
}

/// Queue a change by hand, as change capture would. Returns the item id.
pub(crate) fn enqueue(
    queue: &PushQueue<'_>,
    mappings: &MappingSet,
    mapping_id: &str,
    entity_id: &str,
    op: &str,
    payload: Option<&str>,
) -> Result<i64> {
    let mapping = mappings
        .get(mapping_id)
        .ok_or_else(|| CoreError::MappingNotFound(mapping_id.to_string()))?;
    let op = LocalOp::from_str(op)?;
    if entity_id.trim().is_empty() {
        return Err(CoreError::InvalidInput("entity id must not be empty".to_string()).into());
    }
    let payload = parse_payload(payload)?;

    queue
        .enqueue(mapping, entity_id, op, payload.as_ref())?
        .ok_or_else(|| Error::OpNotPushed { mapping: mapping.id.clone(), op: op.to_string() })
}

/// Clear expired leases, or every lease when `all` is set.
pub(crate) fn release(db: &Database, all: bool, now: DateTime<Utc>) -> Result<usize> {
    if !all {
        return Ok(db.release_expired_queue_items(now)?);
    }
    let claimed: Vec<i64> = db
        .list_queue_items(None)?
        .into_iter()
        .filter(|item| item.expire != 0)
        .map(|item| item.item_id)
        .collect();
    Ok(db.release_queue_items(&claimed)?)
}

pub(crate) fn remove(db: &Database, item_id: i64) -> Result<()> {
    if db.remove_queue_item(item_id)? {
        Ok(())
    } else {
        Err(Error::QueueItemNotFound(item_id))
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
