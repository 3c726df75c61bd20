// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote identifiers and records.
//!
//! Remote ids come in a 15-character case-sensitive form and an
//! 18-character form with a case-encoding checksum suffix. [`RemoteId`]
//! always holds the 18-character form so that both spellings of the same
//! id compare equal.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const SUFFIX_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";

/// An opaque remote record identifier, normalised to 18 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Parses a 15- or 18-character id.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 15-character case-sensitive form.
    pub fn short(&self) -> &str {
        &self.0[..15]
    }
}

/// Computes the 3-character suffix that encodes the case of a 15-character id.
fn checksum_suffix(id15: &str) -> String {
    id15.as_bytes()
        .chunks(5)
        .map(|chunk| {
            let bits = chunk
                .iter()
                .enumerate()
                .filter(|(_, b)| b.is_ascii_uppercase())
                .fold(0usize, |acc, (i, _)| acc | (1 << i));
            SUFFIX_ALPHABET[bits] as char
        })
        .collect()
}

impl FromStr for RemoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::InvalidRemoteId(s.to_string()));
        }
        match s.len() {
            15 => Ok(RemoteId(format!("{}{}", s, checksum_suffix(s)))),
            18 => Ok(RemoteId(format!("{}{}", &s[..15], checksum_suffix(&s[..15])))),
            _ => Err(Error::InvalidRemoteId(s.to_string())),
        }
    }
}

impl TryFrom<String> for RemoteId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> String {
        id.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a remote datetime value.
///
/// Accepts RFC3339 and the `2024-01-01T00:00:00.000+0000` form the remote
/// API returns in record fields.
pub fn parse_remote_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|dt| dt.and_utc())
}

/// Formats a datetime the way the remote API expects in queries.
pub fn format_remote_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A remote record: an id, an object type and a bag of field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    id: RemoteId,
    object_type: String,
    fields: BTreeMap<String, Value>,
}

impl RemoteRecord {
    pub fn new(id: RemoteId, object_type: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("Id".to_string(), Value::String(id.to_string()));
        RemoteRecord { id, object_type: object_type.into(), fields }
    }

    /// Returns a copy with `name` set to `value`.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builds a record from an API response object.
    ///
    /// The object must carry an `Id` field and an `attributes.type`.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::MalformedRecord("an object body".to_string()));
        };
        let id = map
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedRecord("an Id".to_string()))?
            .parse::<RemoteId>()?;
        let object_type = map
            .get("attributes")
            .and_then(|a| a.get("type"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedRecord("a type".to_string()))?
            .to_string();
        let mut fields: BTreeMap<String, Value> =
            map.into_iter().filter(|(k, _)| k != "attributes").collect();
        fields.insert("Id".to_string(), Value::String(id.to_string()));
        Ok(RemoteRecord { id, object_type, fields })
    }

    pub fn id(&self) -> &RemoteId {
        &self.id
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// The raw value of a field, if the record carries it.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the field is present and non-null.
    pub fn has_value(&self, name: &str) -> bool {
        self.field(name).is_some_and(|v| !v.is_null())
    }

    /// A field parsed as a datetime. Missing or unparseable values are `None`.
    pub fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.field(name).and_then(Value::as_str).and_then(parse_remote_datetime)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
