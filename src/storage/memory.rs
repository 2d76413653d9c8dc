// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory [`DocumentStore`] backed by a `DashMap`.
//!
//! Every mutation goes through the map's entry API, so a single document is
//! updated under its shard lock and `union_upsert` / `put_if_version` are
//! atomic with respect to concurrent callers.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};

use super::traits::{DocumentStore, SetOptions, StorageError};
use crate::document::{validate_segment, Document, DocumentRef};

pub struct InMemoryStore {
    data: DashMap<DocumentRef, Document>,
    native_union: bool,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            native_union: true,
        }
    }

    /// A store without the set-union primitive; `union_upsert` reports
    /// `Unsupported` and callers must use conditional writes.
    #[must_use]
    pub fn without_union() -> Self {
        Self {
            data: DashMap::new(),
            native_union: false,
        }
    }

    /// Get current document count
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Distinct collection names that currently hold documents.
    #[must_use]
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data.iter().map(|r| r.key().collection.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn clear(&self) {
        self.data.clear();
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn require_object(data: Value) -> Result<Map<String, Value>, StorageError> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::InvalidData(format!(
            "document data must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Shallow merge of top-level fields.
fn merge_fields(target: &mut Value, patch: Map<String, Value>) {
    match target {
        Value::Object(existing) => existing.extend(patch),
        other => *other = Value::Object(patch),
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn add(&self, collection: &str, data: Value) -> Result<DocumentRef, StorageError> {
        validate_segment(collection)?;
        let fields = require_object(data)?;
        let reference = DocumentRef::new(collection, uuid::Uuid::new_v4().simple().to_string());
        self.data.insert(
            reference.clone(),
            Document {
                reference: reference.clone(),
                version: 1,
                data: Value::Object(fields),
            },
        );
        Ok(reference)
    }

    async fn set(&self, doc: &DocumentRef, data: Value, options: SetOptions) -> Result<(), StorageError> {
        doc.validate()?;
        let fields = require_object(data)?;
        match self.data.entry(doc.clone()) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get_mut();
                if options.merge {
                    merge_fields(&mut stored.data, fields);
                } else {
                    stored.data = Value::Object(fields);
                }
                stored.version += 1;
            }
            Entry::Vacant(entry) => {
                entry.insert(Document {
                    reference: doc.clone(),
                    version: 1,
                    data: Value::Object(fields),
                });
            }
        }
        Ok(())
    }

    async fn get(&self, doc: &DocumentRef) -> Result<Option<Document>, StorageError> {
        doc.validate()?;
        Ok(self.data.get(doc).map(|r| r.value().clone()))
    }

    async fn update(&self, doc: &DocumentRef, data: Value) -> Result<(), StorageError> {
        doc.validate()?;
        let fields = require_object(data)?;
        match self.data.get_mut(doc) {
            Some(mut stored) => {
                merge_fields(&mut stored.data, fields);
                stored.version += 1;
                Ok(())
            }
            None => Err(StorageError::NotFound(doc.path())),
        }
    }

    async fn delete(&self, doc: &DocumentRef) -> Result<(), StorageError> {
        doc.validate()?;
        self.data.remove(doc);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        validate_segment(collection)?;
        let mut docs: Vec<Document> = self
            .data
            .iter()
            .filter(|r| r.key().collection == collection)
            .map(|r| r.value().clone())
            .collect();
        docs.sort_by(|a, b| a.reference.id.cmp(&b.reference.id));
        Ok(docs)
    }

    async fn union_upsert(
        &self,
        doc: &DocumentRef,
        field: &str,
        values: &[String],
        fields: Map<String, Value>,
    ) -> Result<(), StorageError> {
        if !self.native_union {
            return Err(StorageError::Unsupported("union_upsert"));
        }
        doc.validate()?;

        match self.data.entry(doc.clone()) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get_mut();
                if !stored.data.is_object() {
                    stored.data = Value::Object(Map::new());
                }
                if let Value::Object(map) = &mut stored.data {
                    let slot = map.entry(field.to_string()).or_insert_with(|| Value::Array(Vec::new()));
                    if !slot.is_array() {
                        *slot = Value::Array(Vec::new());
                    }
                    if let Value::Array(items) = slot {
                        // Foreign entries would leave the array undecodable.
                        items.retain(Value::is_string);
                        for value in values {
                            let candidate = Value::String(value.clone());
                            if !items.contains(&candidate) {
                                items.push(candidate);
                            }
                        }
                    }
                    map.extend(fields);
                }
                stored.version += 1;
            }
            Entry::Vacant(entry) => {
                let mut items: Vec<Value> = Vec::with_capacity(values.len());
                for value in values {
                    let candidate = Value::String(value.clone());
                    if !items.contains(&candidate) {
                        items.push(candidate);
                    }
                }
                let mut map = Map::new();
                map.insert(field.to_string(), Value::Array(items));
                map.extend(fields);
                entry.insert(Document {
                    reference: doc.clone(),
                    version: 1,
                    data: Value::Object(map),
                });
            }
        }
        Ok(())
    }

    async fn put_if_version(
        &self,
        doc: &DocumentRef,
        data: Value,
        expected_version: u64,
    ) -> Result<u64, StorageError> {
        doc.validate()?;
        let fields = require_object(data)?;
        match self.data.entry(doc.clone()) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get_mut();
                if stored.version != expected_version {
                    return Err(StorageError::Conflict {
                        path: doc.path(),
                        expected: expected_version,
                        actual: stored.version,
                    });
                }
                stored.data = Value::Object(fields);
                stored.version += 1;
                Ok(stored.version)
            }
            Entry::Vacant(entry) => {
                if expected_version != 0 {
                    return Err(StorageError::Conflict {
                        path: doc.path(),
                        expected: expected_version,
                        actual: 0,
                    });
                }
                entry.insert(Document {
                    reference: doc.clone(),
                    version: 1,
                    data: Value::Object(fields),
                });
                Ok(1)
            }
        }
    }
}
