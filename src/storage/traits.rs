// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::{Document, DocumentRef};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Write conflict on '{path}': expected version {expected}, found {actual}")]
    Conflict {
        path: String,
        expected: u64,
        actual: u64,
    },
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid document data: {0}")]
    InvalidData(String),
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Short, stable error code in the style document-store SDKs report.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::PermissionDenied(_) => "permission-denied",
            Self::Unavailable(_) => "unavailable",
            Self::Conflict { .. } => "aborted",
            Self::InvalidPath(_) | Self::InvalidData(_) => "invalid-argument",
            Self::Unsupported(_) => "unimplemented",
            Self::Backend(_) => "internal",
        }
    }

    /// Conflicts are the only errors an optimistic writer should retry.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Options for [`DocumentStore::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Merge top-level fields into an existing document instead of replacing it.
    pub merge: bool,
}

impl SetOptions {
    #[must_use]
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// Shared handle to a document store, passed explicitly to everything that talks to it.
pub type StoreHandle = Arc<dyn DocumentStore>;

/// The external document store the registry runs against.
///
/// Implementations must be safe to share across tasks; the store handle is
/// passed around as `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a store-generated id.
    async fn add(&self, collection: &str, data: Value) -> Result<DocumentRef, StorageError>;

    /// Create or overwrite the document at `doc`.
    async fn set(&self, doc: &DocumentRef, data: Value, options: SetOptions) -> Result<(), StorageError>;

    async fn get(&self, doc: &DocumentRef) -> Result<Option<Document>, StorageError>;

    /// Shallow-merge `data` into an existing document. Fails with `NotFound` if absent.
    async fn update(&self, doc: &DocumentRef, data: Value) -> Result<(), StorageError>;

    /// Deleting a missing document is not an error.
    async fn delete(&self, doc: &DocumentRef) -> Result<(), StorageError>;

    /// All documents of a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StorageError>;

    /// Atomic upsert that set-unions `values` into the array `field` and
    /// overwrites the plain `fields`. Concurrent callers never lose each
    /// other's values.
    ///
    /// Stores without this primitive keep the default, which reports
    /// `Unsupported` so callers can fall back to [`put_if_version`](Self::put_if_version).
    async fn union_upsert(
        &self,
        _doc: &DocumentRef,
        _field: &str,
        _values: &[String],
        _fields: Map<String, Value>,
    ) -> Result<(), StorageError> {
        Err(StorageError::Unsupported("union_upsert"))
    }

    /// Conditional write: succeeds only if the current version equals
    /// `expected_version` (`0` meaning "must not exist"). Returns the new version.
    async fn put_if_version(
        &self,
        doc: &DocumentRef,
        data: Value,
        expected_version: u64,
    ) -> Result<u64, StorageError>;
}
