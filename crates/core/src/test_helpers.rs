// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared doubles for unit tests.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Mutex;

use crate::clock::FixedClock;
use crate::context::{SyncContext, SyncSettings};
use crate::db::Database;
use crate::entity::{Entity, EntityStore, MemoryEntityStore, Origin};
use crate::error::{Error, Result};
use crate::field::FieldMapping;
use crate::mapping::{Mapping, MappingSet, PushParams};
use crate::notify::{render, Notifier, Severity};
use crate::record::{RemoteId, RemoteRecord};
use crate::remote::{DeletedRecords, RemoteApi, RemoteError, RemoteResult};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
}

pub fn sfid(n: u32) -> RemoteId {
    RemoteId::parse(&format!("003{:012}AAA", n)).unwrap()
}

/// A `user`/`user` to `Contact` mapping with email and name fields.
pub fn contact_mapping() -> Mapping {
    Mapping::new("contacts", "user", "user", "Contact")
        .with_field(FieldMapping::property("mail", "Email"))
        .with_field(FieldMapping::property("name", "LastName"))
}

pub fn user(mail: &str) -> Entity {
    Entity::new("user", "user").with_field("mail", mail).with_field("name", "Lovelace")
}

/// One remote call as seen by [`FakeRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Query(String),
    Create { object_type: String, params: PushParams },
    Update { object_type: String, id: RemoteId, params: PushParams },
    Upsert { object_type: String, key_field: String, key_value: Value, params: PushParams },
    Delete { object_type: String, id: RemoteId },
    Read { object_type: String, id: RemoteId },
    GetDeleted { object_type: String, start: String, end: String },
}

#[derive(Default)]
struct Failures {
    create: Option<RemoteError>,
    update: Option<RemoteError>,
    upsert: Option<RemoteError>,
    delete: Option<RemoteError>,
    query: Option<RemoteError>,
    get_deleted: Option<RemoteError>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<RemoteCall>,
    failures: Failures,
    unauthorized: bool,
    next_id: u32,
    query_results: Vec<RemoteRecord>,
    deleted: Option<DeletedRecords>,
}

/// Scripted [`RemoteApi`] that records every call.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn set_authorized(&self, authorized: bool) {
        self.state.lock().unwrap().unauthorized = !authorized;
    }

    pub fn fail_create(&self, err: Option<RemoteError>) {
        self.state.lock().unwrap().failures.create = err;
    }

    pub fn fail_update(&self, err: Option<RemoteError>) {
        self.state.lock().unwrap().failures.update = err;
    }

    pub fn fail_upsert(&self, err: Option<RemoteError>) {
        self.state.lock().unwrap().failures.upsert = err;
    }

    pub fn fail_delete(&self, err: Option<RemoteError>) {
        self.state.lock().unwrap().failures.delete = err;
    }

    pub fn fail_query(&self, err: Option<RemoteError>) {
        self.state.lock().unwrap().failures.query = err;
    }

    pub fn fail_get_deleted(&self, err: Option<RemoteError>) {
        self.state.lock().unwrap().failures.get_deleted = err;
    }

    pub fn set_query_results(&self, records: Vec<RemoteRecord>) {
        self.state.lock().unwrap().query_results = records;
    }

    pub fn set_deleted(&self, deleted: DeletedRecords) {
        self.state.lock().unwrap().deleted = Some(deleted);
    }

    fn next_id(state: &mut FakeState) -> RemoteId {
        state.next_id += 1;
        sfid(state.next_id)
    }
}

impl RemoteApi for FakeRemote {
    fn is_authorized(&self) -> bool {
        !self.state.lock().unwrap().unauthorized
    }

    fn query(&self, soql: &str) -> RemoteResult<Vec<RemoteRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Query(soql.to_string()));
        if let Some(err) = state.failures.query.clone() {
            return Err(err);
        }
        Ok(state.query_results.clone())
    }

    fn object_create(&self, object_type: &str, params: &PushParams) -> RemoteResult<RemoteId> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Create {
            object_type: object_type.to_string(),
            params: params.clone(),
        });
        if let Some(err) = state.failures.create.clone() {
            return Err(err);
        }
        Ok(Self::next_id(&mut state))
    }

    fn object_update(
        &self,
        object_type: &str,
        id: &RemoteId,
        params: &PushParams,
    ) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Update {
            object_type: object_type.to_string(),
            id: id.clone(),
            params: params.clone(),
        });
        match state.failures.update.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn object_upsert(
        &self,
        object_type: &str,
        key_field: &str,
        key_value: &Value,
        params: &PushParams,
    ) -> RemoteResult<RemoteId> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Upsert {
            object_type: object_type.to_string(),
            key_field: key_field.to_string(),
            key_value: key_value.clone(),
            params: params.clone(),
        });
        if let Some(err) = state.failures.upsert.clone() {
            return Err(err);
        }
        Ok(Self::next_id(&mut state))
    }

    fn object_delete(&self, object_type: &str, id: &RemoteId) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Delete { object_type: object_type.to_string(), id: id.clone() });
        match state.failures.delete.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn object_read(&self, object_type: &str, id: &RemoteId) -> RemoteResult<RemoteRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Read { object_type: object_type.to_string(), id: id.clone() });
        state
            .query_results
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    fn get_deleted(&self, object_type: &str, start: &str, end: &str) -> RemoteResult<DeletedRecords> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::GetDeleted {
            object_type: object_type.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        });
        if let Some(err) = state.failures.get_deleted.clone() {
            return Err(err);
        }
        Ok(state.deleted.clone().unwrap_or_default())
    }
}

/// One event seen by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub severity: Severity,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Event>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.events.lock().unwrap().iter().filter(|e| e.severity == severity).count()
    }

    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, error: Option<&Error>, template: &str, args: &[(&str, &str)]) {
        self.events.lock().unwrap().push(Event {
            severity,
            message: render(template, args),
            error: error.map(|e| e.to_string()),
        });
    }
}

/// A store whose deletes always fail.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryEntityStore,
}

impl EntityStore for FailingStore {
    fn load(&self, entity_type: &str, entity_id: &str) -> Result<Option<Entity>> {
        self.inner.load(entity_type, entity_id)
    }

    fn save(&self, entity: &mut Entity, origin: Origin) -> Result<()> {
        self.inner.save(entity, origin)
    }

    fn delete(&self, _entity: &Entity, _origin: Origin) -> Result<()> {
        Err(Error::EntityStore("delete refused".to_string()))
    }
}

/// A store that cannot load the listed entity ids.
#[derive(Default)]
pub struct UnreadableStore {
    pub inner: MemoryEntityStore,
    pub unreadable: Vec<String>,
}

impl EntityStore for UnreadableStore {
    fn load(&self, entity_type: &str, entity_id: &str) -> Result<Option<Entity>> {
        if self.unreadable.iter().any(|id| id == entity_id) {
            return Err(Error::EntityStore("transient load failure".to_string()));
        }
        self.inner.load(entity_type, entity_id)
    }

    fn save(&self, entity: &mut Entity, origin: Origin) -> Result<()> {
        self.inner.save(entity, origin)
    }

    fn delete(&self, entity: &Entity, origin: Origin) -> Result<()> {
        self.inner.delete(entity, origin)
    }
}

/// Owned collaborators for one test; borrow them with [`Fixture::ctx`].
pub struct Fixture {
    pub db: Database,
    pub mappings: MappingSet,
    pub remote: FakeRemote,
    pub store: MemoryEntityStore,
    pub notifier: RecordingNotifier,
    pub clock: FixedClock,
    pub settings: SyncSettings,
}

impl Fixture {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Fixture {
            db: Database::open_in_memory().unwrap(),
            mappings: MappingSet::new(mappings).unwrap(),
            remote: FakeRemote::new(),
            store: MemoryEntityStore::new(),
            notifier: RecordingNotifier::new(),
            clock: FixedClock::new(t0()),
            settings: SyncSettings::default(),
        }
    }

    pub fn ctx(&self) -> SyncContext<'_> {
        SyncContext {
            db: &self.db,
            mappings: &self.mappings,
            remote: &self.remote,
            store: &self.store,
            notifier: &self.notifier,
            clock: &self.clock,
            settings: &self.settings,
        }
    }

    pub fn mapping(&self, id: &str) -> &Mapping {
        self.mappings.get(id).unwrap()
    }
}
