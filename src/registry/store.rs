// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Read and merge access to the manifest document.
//!
//! `merge` prefers the store's atomic set-union upsert. Stores that lack it
//! get an optimistic loop instead: read the versioned manifest, union the
//! name in, write conditionally on the version read, and retry on conflict.
//! Either way concurrent registrations of different names commute.

use serde_json::{Map, Value};
use tracing::debug;

use super::manifest::{Manifest, COLLECTION_NAMES_FIELD, LAST_UPDATED_FIELD};
use super::{MANIFEST_DOC, REGISTRY_COLLECTION};
use crate::document::{now_millis, DocumentRef};
use crate::resilience::retry::{retry_when, RetryConfig};
use crate::storage::traits::{StorageError, StoreHandle};

/// How a merge reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePath {
    /// Native set-union upsert
    Union,
    /// Read + conditional write loop
    Optimistic,
}

impl std::fmt::Display for MergePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Union => write!(f, "union"),
            Self::Optimistic => write!(f, "optimistic"),
        }
    }
}

#[derive(Clone)]
pub struct RegistryStore {
    store: StoreHandle,
    retry: RetryConfig,
}

impl RegistryStore {
    pub fn new(store: StoreHandle, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// `_app_registry/manifest`
    #[must_use]
    pub fn manifest_ref() -> DocumentRef {
        DocumentRef::new(REGISTRY_COLLECTION, MANIFEST_DOC)
    }

    /// Current manifest, or `None` if nothing was ever registered.
    pub async fn read(&self) -> Result<Option<Manifest>, StorageError> {
        match self.store.get(&Self::manifest_ref()).await? {
            Some(doc) => Ok(Some(Manifest::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// Union `name` into the manifest, creating it if needed.
    ///
    /// The caller is expected to have filtered out reserved and empty names.
    pub async fn merge(&self, name: &str) -> Result<MergePath, StorageError> {
        let mut fields = Map::new();
        fields.insert(LAST_UPDATED_FIELD.to_string(), Value::from(now_millis()));

        match self
            .store
            .union_upsert(&Self::manifest_ref(), COLLECTION_NAMES_FIELD, &[name.to_string()], fields)
            .await
        {
            Ok(()) => Ok(MergePath::Union),
            Err(StorageError::Unsupported(_)) => {
                debug!(collection = %name, "store has no union upsert, merging optimistically");
                self.merge_optimistic(name).await?;
                Ok(MergePath::Optimistic)
            }
            Err(e) => Err(e),
        }
    }

    async fn merge_optimistic(&self, name: &str) -> Result<(), StorageError> {
        let manifest_ref = Self::manifest_ref();
        retry_when("manifest_merge", &self.retry, StorageError::is_conflict, || {
            let manifest_ref = &manifest_ref;
            async move {
                let (current, version) = match self.store.get(manifest_ref).await? {
                    Some(doc) => (Manifest::from_document(&doc)?, doc.version),
                    None => (Manifest::default(), 0),
                };
                let next = current.merged_with(name, now_millis());
                self.store.put_if_version(manifest_ref, next.to_value()?, version).await?;
                Ok::<(), StorageError>(())
            }
        })
        .await
    }
}
