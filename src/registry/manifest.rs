// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The manifest record and its merge rules.
//!
//! The manifest is a single document holding the set of registered
//! collection names. Merging is a plain set union: names are only ever
//! added, registering a known name changes nothing, and the registry's own
//! collection is never recorded.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::REGISTRY_COLLECTION;
use crate::document::{validate_segment, Document};
use crate::storage::traits::StorageError;

/// Array field holding the registered names.
pub const COLLECTION_NAMES_FIELD: &str = "collectionNames";
/// Epoch-millis timestamp of the last successful merge.
pub const LAST_UPDATED_FIELD: &str = "lastUpdated";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub collection_names: BTreeSet<String>,
    #[serde(default)]
    pub last_updated: i64,
}

impl Manifest {
    pub fn from_document(doc: &Document) -> Result<Self, StorageError> {
        serde_json::from_value(doc.data.clone()).map_err(|e| {
            StorageError::InvalidData(format!("manifest at '{}' is malformed: {}", doc.reference, e))
        })
    }

    pub fn to_value(&self) -> Result<Value, StorageError> {
        serde_json::to_value(self).map_err(|e| StorageError::InvalidData(e.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.collection_names.contains(name)
    }

    /// The manifest after registering `name` at time `now`.
    #[must_use]
    pub fn merged_with(&self, name: &str, now: i64) -> Manifest {
        Manifest {
            collection_names: union(&self.collection_names, name),
            last_updated: now,
        }
    }

    /// Names in presentation order.
    #[must_use]
    pub fn sorted_names(&self) -> Vec<String> {
        self.collection_names.iter().cloned().collect()
    }
}

/// Set union of the persisted names and one candidate.
#[must_use]
pub fn union(current: &BTreeSet<String>, candidate: &str) -> BTreeSet<String> {
    let mut next = current.clone();
    next.insert(candidate.to_string());
    next
}

/// Why a registration request was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank after trimming
    Empty,
    /// The registry's own collection
    Reserved,
    /// Not usable as a collection name
    Invalid,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Reserved => write!(f, "reserved"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Normalize a requested name, or say why it must not be registered.
pub fn registrable_name(raw: &str) -> Result<&str, SkipReason> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SkipReason::Empty);
    }
    if name == REGISTRY_COLLECTION {
        return Err(SkipReason::Reserved);
    }
    if validate_segment(name).is_err() {
        return Err(SkipReason::Invalid);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentRef;
    use serde_json::json;

    fn manifest_doc(data: Value) -> Document {
        Document {
            reference: DocumentRef::new(REGISTRY_COLLECTION, "manifest"),
            version: 1,
            data,
        }
    }

    #[test]
    fn test_union_adds_new_name() {
        let current: BTreeSet<String> = ["orders".to_string()].into_iter().collect();
        let next = union(&current, "users");
        assert_eq!(next.len(), 2);
        assert!(next.contains("orders") && next.contains("users"));
    }

    #[test]
    fn test_union_is_idempotent() {
        let current: BTreeSet<String> = ["orders".to_string()].into_iter().collect();
        assert_eq!(union(&current, "orders"), current);
    }

    #[test]
    fn test_merged_with_refreshes_timestamp_only() {
        let manifest = Manifest::default().merged_with("orders", 10);
        let again = manifest.merged_with("orders", 20);
        assert_eq!(again.collection_names, manifest.collection_names);
        assert_eq!(again.last_updated, 20);
    }

    #[test]
    fn test_from_document_uses_camel_case_fields() {
        let doc = manifest_doc(json!({"collectionNames": ["users", "orders", "users"], "lastUpdated": 99}));
        let manifest = Manifest::from_document(&doc).unwrap();
        assert_eq!(manifest.sorted_names(), vec!["orders", "users"]);
        assert_eq!(manifest.last_updated, 99);
    }

    #[test]
    fn test_from_document_tolerates_missing_fields() {
        let manifest = Manifest::from_document(&manifest_doc(json!({}))).unwrap();
        assert!(manifest.collection_names.is_empty());
        assert_eq!(manifest.last_updated, 0);
    }

    #[test]
    fn test_from_document_rejects_malformed_names() {
        let err = Manifest::from_document(&manifest_doc(json!({"collectionNames": [1, 2]}))).unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[test]
    fn test_to_value_shape() {
        let manifest = Manifest::default().merged_with("orders", 5);
        assert_eq!(
            manifest.to_value().unwrap(),
            json!({"collectionNames": ["orders"], "lastUpdated": 5})
        );
    }

    #[test]
    fn test_registrable_name_rules() {
        assert_eq!(registrable_name("  orders "), Ok("orders"));
        assert_eq!(registrable_name("   "), Err(SkipReason::Empty));
        assert_eq!(registrable_name(REGISTRY_COLLECTION), Err(SkipReason::Reserved));
        assert_eq!(registrable_name("users/u1"), Err(SkipReason::Invalid));
    }
}
