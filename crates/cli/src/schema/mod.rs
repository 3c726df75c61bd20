// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSON output types.
//!
//! Commands convert runtime types into these before printing so the JSON
//! Schema printed by `sfsync schema` describes exactly what `-o json` emits.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use sfsync_core::{FieldMapping, LocalOp, MappedObject, Mapping, QueueItem, SyncAction};

/// Output of `mappings list -o json`.
#[derive(JsonSchema, Serialize)]
pub struct MappingsOutputJson {
    pub mappings: Vec<MappingJson>,
}

/// One mapping.
#[derive(JsonSchema, Serialize)]
pub struct MappingJson {
    /// Unique mapping id.
    pub id: String,
    pub label: String,
    /// Ordering for scheduled push runs; lower runs first.
    pub weight: i32,
    pub drupal_entity_type: String,
    pub drupal_bundle: String,
    pub salesforce_object_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salesforce_record_type: Option<String>,
    /// Remote field used for upserts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Enabled triggers, e.g. `push_create`.
    pub sync_triggers: Vec<String>,
    pub fields: Vec<FieldJson>,
    pub push_limit: usize,
    pub push_retries: u32,
    pub push_frequency: u64,
    pub pull_frequency: u64,
    pub pull_trigger_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_where_clause: Option<String>,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub push_standalone: bool,
    pub push_processor: String,
}

/// One field mapping.
#[derive(JsonSchema, Serialize)]
pub struct FieldJson {
    /// `properties`, `constant` or `entity_id`.
    pub drupal_field_type: String,
    pub salesforce_field: String,
    /// Local field name or constant value; absent for `entity_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drupal_field_value: Option<Value>,
    pub push: bool,
    pub pull: bool,
}

impl From<&FieldMapping> for FieldJson {
    fn from(field: &FieldMapping) -> Self {
        let drupal_field_value = match field {
            FieldMapping::Properties { drupal_field_value, .. } => Some(Value::from(drupal_field_value.as_str())),
            FieldMapping::Constant { drupal_field_value, .. } => Some(drupal_field_value.clone()),
            FieldMapping::EntityId { .. } => None,
        };
        FieldJson {
            drupal_field_type: field.field_type().to_string(),
            salesforce_field: field.salesforce_field().to_string(),
            drupal_field_value,
            push: field.push(),
            pull: field.pull(),
        }
    }
}

impl From<&Mapping> for MappingJson {
    fn from(m: &Mapping) -> Self {
        MappingJson {
            id: m.id.clone(),
            label: m.label.clone(),
            weight: m.weight,
            drupal_entity_type: m.drupal_entity_type.clone(),
            drupal_bundle: m.drupal_bundle.clone(),
            salesforce_object_type: m.salesforce_object_type.clone(),
            salesforce_record_type: m.salesforce_record_type.clone(),
            key: m.key.clone(),
            sync_triggers: m.sync_triggers.iter().map(|t| t.as_str().to_string()).collect(),
            fields: m.field_mappings.iter().map(FieldJson::from).collect(),
            push_limit: m.push_limit,
            push_retries: m.push_retries,
            push_frequency: m.push_frequency,
            pull_frequency: m.pull_frequency,
            pull_trigger_date: m.pull_trigger_date.clone(),
            pull_where_clause: m.pull_where_clause.clone(),
            is_async: m.is_async,
            push_standalone: m.push_standalone,
            push_processor: m.push_processor.clone(),
        }
    }
}

/// Output of `queue list -o json`.
#[derive(JsonSchema, Serialize)]
pub struct QueueOutputJson {
    pub items: Vec<QueueItemJson>,
}

/// Local operation carried by a queue item.
#[derive(JsonSchema, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OpJson {
    Create,
    Update,
    Delete,
}

impl From<LocalOp> for OpJson {
    fn from(op: LocalOp) -> Self {
        match op {
            LocalOp::Create => OpJson::Create,
            LocalOp::Update => OpJson::Update,
            LocalOp::Delete => OpJson::Delete,
        }
    }
}

/// One pending push item.
#[derive(JsonSchema, Serialize)]
pub struct QueueItemJson {
    pub item_id: i64,
    pub mapping_id: String,
    pub entity_id: String,
    pub op: OpJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub fail_count: u32,
    pub revision: i64,
    /// Whether a live lease is held.
    pub claimed: bool,
    /// Lease expiry, when claimed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_expires: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl QueueItemJson {
    pub fn new(item: &QueueItem, now: DateTime<Utc>) -> Self {
        let claimed = item.is_claimed(now);
        QueueItemJson {
            item_id: item.item_id,
            mapping_id: item.mapping_id.clone(),
            entity_id: item.entity_id.clone(),
            op: item.op.into(),
            payload: item.payload.clone(),
            fail_count: item.fail_count,
            revision: item.revision,
            claimed,
            lease_expires: claimed.then(|| DateTime::from_timestamp(item.expire, 0)).flatten(),
            created: item.created,
            updated: item.updated,
        }
    }
}

/// Output of `links list -o json`.
#[derive(JsonSchema, Serialize)]
pub struct LinksOutputJson {
    pub links: Vec<LinkJson>,
}

/// Direction of the last sync.
#[derive(JsonSchema, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SyncActionJson {
    Push,
    Pull,
}

impl From<SyncAction> for SyncActionJson {
    fn from(action: SyncAction) -> Self {
        match action {
            SyncAction::Push => SyncActionJson::Push,
            SyncAction::Pull => SyncActionJson::Pull,
        }
    }
}

/// One mapped object.
#[derive(JsonSchema, Serialize)]
pub struct LinkJson {
    pub id: i64,
    pub entity_type_id: String,
    pub entity_id: String,
    /// Canonical 18-character remote id.
    pub salesforce_id: String,
    pub salesforce_mapping: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    pub last_sync_action: SyncActionJson,
    pub last_sync_status: bool,
    /// Error text of the last failed sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_log_message: Option<String>,
    pub force_pull: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&MappedObject> for LinkJson {
    fn from(mo: &MappedObject) -> Self {
        LinkJson {
            id: mo.id,
            entity_type_id: mo.entity_type_id.clone(),
            entity_id: mo.entity_id.clone(),
            salesforce_id: mo.salesforce_id.to_string(),
            salesforce_mapping: mo.salesforce_mapping.clone(),
            entity_updated: mo.entity_updated,
            last_sync: mo.last_sync,
            last_sync_action: mo.last_sync_action.into(),
            last_sync_status: mo.last_sync_status,
            revision_log_message: mo.revision_log_message.clone(),
            force_pull: mo.force_pull,
            created_at: mo.created_at,
        }
    }
}

/// Output of `state show -o json`.
#[derive(JsonSchema, Serialize)]
pub struct StateOutputJson {
    pub entries: Vec<StateEntryJson>,
}

/// One stored checkpoint or last-run time.
#[derive(JsonSchema, Serialize)]
pub struct StateEntryJson {
    pub key: String,
    pub value: String,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
