// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local entities and the store they live in.
//!
//! The sync engines never talk to the host application's storage directly;
//! they go through [`EntityStore`]. Every write carries an [`Origin`] so the
//! host can suppress change capture for writes made by the pull side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::Result;

/// Who is responsible for a local write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A user or application write; eligible for push.
    Local,
    /// A write made while applying remote changes; never pushed back.
    RemoteSync,
}

/// A local entity: type, bundle, id and field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: String,
    pub bundle: String,
    /// `None` until the entity has been saved.
    pub id: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// Last local modification time.
    pub changed: Option<DateTime<Utc>>,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, bundle: impl Into<String>) -> Self {
        Entity {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            id: None,
            fields: BTreeMap::new(),
            changed: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_changed(mut self, changed: DateTime<Utc>) -> Self {
        self.changed = Some(changed);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// A human-readable label for notifications.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("{} {}", self.entity_type, id),
            None => format!("new {}", self.entity_type),
        }
    }
}

/// Access to local entities.
pub trait EntityStore {
    /// Loads an entity, returning `None` if it does not exist.
    fn load(&self, entity_type: &str, entity_id: &str) -> Result<Option<Entity>>;

    /// Saves an entity, assigning an id if it is new and stamping `changed`.
    fn save(&self, entity: &mut Entity, origin: Origin) -> Result<()>;

    /// Deletes an entity.
    fn delete(&self, entity: &Entity, origin: Origin) -> Result<()>;
}

/// Kind of write recorded by [`MemoryEntityStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Save,
    Delete,
}

/// One write observed by [`MemoryEntityStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWrite {
    pub kind: WriteKind,
    pub entity_type: String,
    pub entity_id: String,
    pub origin: Origin,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entities: BTreeMap<(String, String), Entity>,
    writes: Vec<StoreWrite>,
    next_id: u64,
}

/// An in-memory [`EntityStore`] that records every write and its origin.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity as-is, without recording a write or touching
    /// `changed`. Returns the entity id.
    pub fn insert(&self, mut entity: Entity) -> String {
        let mut inner = self.lock();
        let id = match &entity.id {
            Some(id) => id.clone(),
            None => {
                inner.next_id += 1;
                inner.next_id.to_string()
            }
        };
        entity.id = Some(id.clone());
        inner.entities.insert((entity.entity_type.clone(), id.clone()), entity);
        id
    }

    /// Returns the stored copy of an entity.
    pub fn get(&self, entity_type: &str, entity_id: &str) -> Option<Entity> {
        self.lock().entities.get(&(entity_type.to_string(), entity_id.to_string())).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every write made through the [`EntityStore`] interface, in order.
    pub fn writes(&self) -> Vec<StoreWrite> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EntityStore for MemoryEntityStore {
    fn load(&self, entity_type: &str, entity_id: &str) -> Result<Option<Entity>> {
        Ok(self.get(entity_type, entity_id))
    }

    fn save(&self, entity: &mut Entity, origin: Origin) -> Result<()> {
        let mut inner = self.lock();
        let id = match &entity.id {
            Some(id) => id.clone(),
            None => {
                inner.next_id += 1;
                let id = inner.next_id.to_string();
                entity.id = Some(id.clone());
                id
            }
        };
        entity.changed = Some(Utc::now());
        inner.entities.insert((entity.entity_type.clone(), id.clone()), entity.clone());
        inner.writes.push(StoreWrite {
            kind: WriteKind::Save,
            entity_type: entity.entity_type.clone(),
            entity_id: id,
            origin,
        });
        Ok(())
    }

    fn delete(&self, entity: &Entity, origin: Origin) -> Result<()> {
        let Some(id) = &entity.id else {
            return Ok(());
        };
        let mut inner = self.lock();
        inner.entities.remove(&(entity.entity_type.clone(), id.clone()));
        inner.writes.push(StoreWrite {
            kind: WriteKind::Delete,
            entity_type: entity.entity_type.clone(),
            entity_id: id.clone(),
            origin,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
