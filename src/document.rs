// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document data structures.
//!
//! A [`Document`] is the unit stored in a [`DocumentStore`](crate::storage::traits::DocumentStore):
//! a JSON object addressed by a [`DocumentRef`] (collection name + document id).
//!
//! # Example
//!
//! ```
//! use collection_registry::DocumentRef;
//!
//! let doc = DocumentRef::new("orders", "order-42");
//! assert_eq!(doc.path(), "orders/order-42");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::traits::StorageError;

/// Address of a single document: `collection/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Slash-joined path, e.g. `_app_registry/manifest`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    /// Reject empty segments and segments containing `/`.
    pub fn validate(&self) -> Result<(), StorageError> {
        validate_segment(&self.collection)?;
        validate_segment(&self.id)
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Check a single path segment (collection name or document id).
pub fn validate_segment(segment: &str) -> Result<(), StorageError> {
    if segment.trim().is_empty() {
        return Err(StorageError::InvalidPath("empty path segment".into()));
    }
    if segment.contains('/') {
        return Err(StorageError::InvalidPath(format!(
            "path segment '{}' must not contain '/'",
            segment
        )));
    }
    Ok(())
}

/// A stored document as returned by reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub reference: DocumentRef,
    /// Store-assigned write counter, starts at 1 and increases on every write.
    /// Used for conditional writes.
    pub version: u64,
    pub data: Value,
}

impl Document {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.reference.id
    }

    /// Flatten into one object: the fields plus the document id under `id`,
    /// which wins over a stored `id` field. This is the shape admin listings show.
    #[must_use]
    pub fn to_flat_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert("id".into(), Value::String(self.reference.id.clone()));
        if let Value::Object(fields) = &self.data {
            for (k, v) in fields {
                if k != "id" {
                    out.insert(k.clone(), v.clone());
                }
            }
        }
        Value::Object(out)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
