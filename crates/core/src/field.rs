// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field mappings: how one remote field relates to a local entity.
//!
//! The variant is chosen by the `drupal_field_type` discriminator when a
//! mapping file is loaded; unknown discriminators are a load error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Entity;
use crate::error::{Error, Result};

fn enabled() -> bool {
    true
}

/// One remote field's correspondence with a local entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "drupal_field_type", rename_all = "snake_case")]
pub enum FieldMapping {
    /// A direct local field, usable in both directions.
    Properties {
        salesforce_field: String,
        /// Name of the local field.
        drupal_field_value: String,
        #[serde(default = "enabled")]
        push: bool,
        #[serde(default = "enabled")]
        pull: bool,
    },
    /// A fixed value sent on every push.
    Constant {
        salesforce_field: String,
        /// The constant itself.
        drupal_field_value: Value,
        #[serde(default = "enabled")]
        push: bool,
    },
    /// The local entity id, sent on push.
    EntityId {
        salesforce_field: String,
        #[serde(default = "enabled")]
        push: bool,
    },
}

impl FieldMapping {
    /// A two-way mapping between a local field and a remote field.
    pub fn property(local: impl Into<String>, remote: impl Into<String>) -> Self {
        FieldMapping::Properties {
            salesforce_field: remote.into(),
            drupal_field_value: local.into(),
            push: true,
            pull: true,
        }
    }

    pub fn constant(remote: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldMapping::Constant {
            salesforce_field: remote.into(),
            drupal_field_value: value.into(),
            push: true,
        }
    }

    pub fn entity_id(remote: impl Into<String>) -> Self {
        FieldMapping::EntityId { salesforce_field: remote.into(), push: true }
    }

    /// Returns the variant discriminator.
    pub fn field_type(&self) -> &'static str {
        match self {
            FieldMapping::Properties { .. } => "properties",
            FieldMapping::Constant { .. } => "constant",
            FieldMapping::EntityId { .. } => "entity_id",
        }
    }

    pub fn salesforce_field(&self) -> &str {
        match self {
            FieldMapping::Properties { salesforce_field, .. }
            | FieldMapping::Constant { salesforce_field, .. }
            | FieldMapping::EntityId { salesforce_field, .. } => salesforce_field,
        }
    }

    pub fn push(&self) -> bool {
        match self {
            FieldMapping::Properties { push, .. }
            | FieldMapping::Constant { push, .. }
            | FieldMapping::EntityId { push, .. } => *push,
        }
    }

    /// Only local fields can receive remote values.
    pub fn pull(&self) -> bool {
        match self {
            FieldMapping::Properties { pull, .. } => *pull,
            FieldMapping::Constant { .. } | FieldMapping::EntityId { .. } => false,
        }
    }

    /// Returns a copy with the direction flags replaced.
    ///
    /// `pull` is ignored for variants that cannot pull.
    pub fn with_direction(mut self, push: bool, pull: bool) -> Self {
        match &mut self {
            FieldMapping::Properties { push: p, pull: q, .. } => {
                *p = push;
                *q = pull;
            }
            FieldMapping::Constant { push: p, .. } | FieldMapping::EntityId { push: p, .. } => {
                *p = push;
            }
        }
        self
    }

    /// The value to push for `entity`. `None` means null.
    pub fn value(&self, entity: &Entity) -> Option<Value> {
        let value = match self {
            FieldMapping::Properties { drupal_field_value, .. } => {
                entity.get(drupal_field_value).cloned()
            }
            FieldMapping::Constant { drupal_field_value, .. } => Some(drupal_field_value.clone()),
            FieldMapping::EntityId { .. } => entity.id.clone().map(Value::String),
        };
        value.filter(|v| !v.is_null())
    }

    /// Applies a pulled remote value to `entity`.
    pub fn set_value(&self, entity: &mut Entity, value: Value) -> Result<()> {
        match self {
            FieldMapping::Properties { drupal_field_value, pull: true, .. } => {
                entity.set(drupal_field_value.clone(), value);
                Ok(())
            }
            _ => Err(Error::InvalidFieldMapping(format!(
                "{} mapping for {} does not pull",
                self.field_type(),
                self.salesforce_field()
            ))),
        }
    }
}

#[cfg(test)]
#[path = "field_tests.rs"]
mod tests;
