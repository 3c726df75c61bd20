// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping configuration.
//!
//! A [`Mapping`] describes one local type/bundle to remote object type
//! correspondence. Mappings are immutable values: they are loaded from a
//! TOML file into a [`MappingSet`], transformed with the `with_*` methods,
//! and written back as a new version of the whole file.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::field::FieldMapping;
use crate::trigger::{SyncTrigger, TriggerSet};

fn default_pull_trigger_date() -> String {
    "LastModifiedDate".to_string()
}

fn default_push_processor() -> String {
    "rest".to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One local type/bundle to remote object type correspondence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Ordering for scheduled push runs; lower runs first.
    #[serde(default)]
    pub weight: i32,
    pub drupal_entity_type: String,
    pub drupal_bundle: String,
    pub salesforce_object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesforce_record_type: Option<String>,
    /// Remote field used for upserts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub sync_triggers: TriggerSet,
    #[serde(default, rename = "field")]
    pub field_mappings: Vec<FieldMapping>,
    /// Items claimed per push run; 0 means only the global ceiling applies.
    #[serde(default)]
    pub push_limit: usize,
    /// Failures tolerated before an item is dropped; 0 retries forever.
    #[serde(default)]
    pub push_retries: u32,
    /// Seconds between push runs.
    #[serde(default)]
    pub push_frequency: u64,
    /// Seconds between pull runs.
    #[serde(default)]
    pub pull_frequency: u64,
    #[serde(default = "default_pull_trigger_date")]
    pub pull_trigger_date: String,
    /// Extra condition appended to pull queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_where_clause: Option<String>,
    /// Queue local changes instead of pushing them immediately.
    #[serde(default, rename = "async", skip_serializing_if = "is_false")]
    pub is_async: bool,
    /// Push from standalone runs rather than scheduled ones.
    #[serde(default, skip_serializing_if = "is_false")]
    pub push_standalone: bool,
    /// Name of the push processor plugin.
    #[serde(default = "default_push_processor")]
    pub push_processor: String,
}

/// Values for a remote write, plus the fields to clear.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PushParams {
    values: BTreeMap<String, Value>,
    #[serde(rename = "fieldsToNull", skip_serializing_if = "Vec::is_empty")]
    fields_to_null: Vec<String>,
}

impl PushParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters carrying a single field.
    pub fn single(field: impl Into<String>, value: Value) -> Self {
        let mut params = Self::new();
        params.set(field, value);
        params
    }

    /// Sets a field; a null value is recorded as a field to clear.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if value.is_null() {
            self.values.remove(&field);
            if !self.fields_to_null.contains(&field) {
                self.fields_to_null.push(field);
            }
        } else {
            self.fields_to_null.retain(|f| f != &field);
            self.values.insert(field, value);
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn fields_to_null(&self) -> &[String] {
        &self.fields_to_null
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.fields_to_null.is_empty()
    }

    /// The request body: values plus a `fieldsToNull` list when needed.
    pub fn to_json(&self) -> Value {
        let mut body: serde_json::Map<String, Value> =
            self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        if !self.fields_to_null.is_empty() {
            body.insert(
                "fieldsToNull".to_string(),
                Value::Array(self.fields_to_null.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(body)
    }
}

impl Mapping {
    /// A mapping with every trigger enabled and no fields.
    pub fn new(
        id: impl Into<String>,
        drupal_entity_type: impl Into<String>,
        drupal_bundle: impl Into<String>,
        salesforce_object_type: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Mapping {
            label: id.clone(),
            id,
            weight: 0,
            drupal_entity_type: drupal_entity_type.into(),
            drupal_bundle: drupal_bundle.into(),
            salesforce_object_type: salesforce_object_type.into(),
            salesforce_record_type: None,
            key: None,
            sync_triggers: TriggerSet::all(),
            field_mappings: Vec::new(),
            push_limit: 0,
            push_retries: 0,
            push_frequency: 0,
            pull_frequency: 0,
            pull_trigger_date: default_pull_trigger_date(),
            pull_where_clause: None,
            is_async: false,
            push_standalone: false,
            push_processor: default_push_processor(),
        }
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_triggers(mut self, triggers: TriggerSet) -> Self {
        self.sync_triggers = triggers;
        self
    }

    pub fn with_key(mut self, key: Option<&str>) -> Self {
        self.key = key.map(str::to_string);
        self
    }

    pub fn with_field(mut self, field: FieldMapping) -> Self {
        self.field_mappings.push(field);
        self
    }

    pub fn with_field_mappings(mut self, fields: Vec<FieldMapping>) -> Self {
        self.field_mappings = fields;
        self
    }

    pub fn with_push_limit(mut self, limit: usize) -> Self {
        self.push_limit = limit;
        self
    }

    pub fn with_push_retries(mut self, retries: u32) -> Self {
        self.push_retries = retries;
        self
    }

    pub fn with_push_frequency(mut self, secs: u64) -> Self {
        self.push_frequency = secs;
        self
    }

    pub fn with_pull_frequency(mut self, secs: u64) -> Self {
        self.pull_frequency = secs;
        self
    }

    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn with_push_standalone(mut self, standalone: bool) -> Self {
        self.push_standalone = standalone;
        self
    }

    pub fn with_push_processor(mut self, processor: impl Into<String>) -> Self {
        self.push_processor = processor.into();
        self
    }

    /// True iff any of `ops` is enabled. An empty `ops` means all six.
    pub fn does_crud(&self, ops: &[SyncTrigger]) -> bool {
        if ops.is_empty() {
            return self.sync_triggers.contains_any(&SyncTrigger::ALL);
        }
        self.sync_triggers.contains_any(ops)
    }

    pub fn does_push(&self) -> bool {
        self.does_crud(&SyncTrigger::PUSH)
    }

    pub fn does_pull(&self) -> bool {
        self.does_crud(&SyncTrigger::PULL)
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Whether this mapping covers the given local type and bundle.
    pub fn applies_to(&self, entity_type: &str, bundle: &str) -> bool {
        self.drupal_entity_type == entity_type && self.drupal_bundle == bundle
    }

    /// Remote write parameters for `entity` built from push-enabled fields.
    pub fn get_push_params(&self, entity: &Entity) -> PushParams {
        let mut params = PushParams::new();
        for field in self.field_mappings.iter().filter(|f| f.push()) {
            params.set(field.salesforce_field(), field.value(entity).unwrap_or(Value::Null));
        }
        params
    }

    pub fn get_pull_fields(&self) -> Vec<&FieldMapping> {
        self.field_mappings.iter().filter(|f| f.pull()).collect()
    }

    /// The field mapping that targets the key field, if any.
    pub fn key_field_mapping(&self) -> Option<&FieldMapping> {
        let key = self.key.as_deref()?;
        self.field_mappings.iter().find(|f| f.salesforce_field() == key)
    }

    /// The local value of the key field; `Ok(None)` when it is null.
    pub fn get_key_value(&self, entity: &Entity) -> Result<Option<Value>> {
        let Some(key) = &self.key else {
            return Err(Error::NoKeyField { mapping: self.id.clone() });
        };
        let field = self.key_field_mapping().ok_or_else(|| Error::KeyFieldNotMapped {
            mapping: self.id.clone(),
            key: key.clone(),
        })?;
        Ok(field.value(entity))
    }

    /// A frequency too large for a [`Duration`] is never due again after a first run.
    fn is_due(frequency: u64, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(last) = last else {
            return true;
        };
        match i64::try_from(frequency).ok().and_then(Duration::try_seconds) {
            Some(frequency) => now.signed_duration_since(last) >= frequency,
            None => false,
        }
    }

    /// Whether `push_frequency` has elapsed since the last push run.
    pub fn is_push_due(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        Self::is_due(self.push_frequency, last, now)
    }

    /// Whether `pull_frequency` has elapsed since the last pull run.
    pub fn is_pull_due(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        Self::is_due(self.pull_frequency, last, now)
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidMapping { mapping: self.id.clone(), reason: reason.into() }
    }

    /// Checks the structural rules a loaded mapping must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("id must not be empty"));
        }
        if self.drupal_entity_type.is_empty() || self.drupal_bundle.is_empty() {
            return Err(self.invalid("local entity type and bundle are required"));
        }
        if self.salesforce_object_type.is_empty() {
            return Err(self.invalid("remote object type is required"));
        }
        if let Some(key) = &self.key {
            let targets = self.field_mappings.iter().filter(|f| f.salesforce_field() == key).count();
            match targets {
                0 => {
                    return Err(Error::KeyFieldNotMapped {
                        mapping: self.id.clone(),
                        key: key.clone(),
                    })
                }
                1 => {}
                _ => return Err(self.invalid(format!("key field {key} is mapped more than once"))),
            }
        }
        if self.does_pull() && self.pull_trigger_date.is_empty() {
            return Err(self.invalid("pull_trigger_date is required for pull triggers"));
        }
        if self.push_processor.is_empty() {
            return Err(self.invalid("push_processor must not be empty"));
        }
        Ok(())
    }
}

/// An ordered, validated collection of mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingSet {
    #[serde(default, rename = "mapping")]
    mappings: Vec<Mapping>,
}

impl MappingSet {
    /// Builds a set, validating each mapping and id uniqueness.
    pub fn new(mappings: Vec<Mapping>) -> Result<Self> {
        let set = MappingSet { mappings };
        set.validate()?;
        Ok(set)
    }

    /// Loads mappings from a TOML file. A missing file is an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let set: MappingSet = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse mappings: {}", e)))?;
        set.validate()?;
        Ok(set)
    }

    /// Writes the whole set, replacing the previous version.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize mappings: {}", e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for mapping in &self.mappings {
            mapping.validate()?;
            if !seen.insert(mapping.id.as_str()) {
                return Err(mapping.invalid("duplicate mapping id"));
            }
        }
        Ok(())
    }

    /// Returns a new set with `mapping` replacing the one with the same id,
    /// or appended if none exists.
    pub fn with_mapping(&self, mapping: Mapping) -> Result<Self> {
        let mut mappings = self.mappings.clone();
        match mappings.iter_mut().find(|m| m.id == mapping.id) {
            Some(existing) => *existing = mapping,
            None => mappings.push(mapping),
        }
        Self::new(mappings)
    }

    /// Returns a new set without the mapping `id`.
    pub fn without_mapping(&self, id: &str) -> Self {
        MappingSet { mappings: self.mappings.iter().filter(|m| m.id != id).cloned().collect() }
    }

    pub fn get(&self, id: &str) -> Option<&Mapping> {
        self.mappings.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Push-enabled mappings by ascending weight, ties in declaration order.
    pub fn push_mappings(&self) -> Vec<&Mapping> {
        let mut mappings: Vec<&Mapping> = self.mappings.iter().filter(|m| m.does_push()).collect();
        mappings.sort_by_key(|m| m.weight);
        mappings
    }

    /// Pull-enabled mappings in declaration order.
    pub fn pull_mappings(&self) -> Vec<&Mapping> {
        self.mappings.iter().filter(|m| m.does_pull()).collect()
    }

    /// Mappings covering a local type and bundle.
    pub fn for_entity(&self, entity_type: &str, bundle: &str) -> Vec<&Mapping> {
        self.mappings.iter().filter(|m| m.applies_to(entity_type, bundle)).collect()
    }

    /// Distinct remote object types in declaration order.
    pub fn mapped_object_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for mapping in &self.mappings {
            if !types.contains(&mapping.salesforce_object_type.as_str()) {
                types.push(&mapping.salesforce_object_type);
            }
        }
        types
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
