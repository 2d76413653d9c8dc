// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document writes that keep the registry up to date.
//!
//! Every write goes to the store first. Only once it has succeeded is the
//! target collection registered, on a detached task. The write's result
//! depends on the primary operation alone:
//!
//! ```text
//! add_doc / set_doc ──► store.add / store.set ──Err──► returned to caller (no registration)
//!                                │
//!                                Ok
//!                                ├──► WriteResult returned
//!                                └──► spawn(register_collection)   failures: warn! + dropped
//! ```

use serde_json::Value;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::document::DocumentRef;
use crate::metrics::{self, LatencyTimer};
use crate::registry::{Registry, RegistrationTask};
use crate::storage::traits::{SetOptions, StorageError, StoreHandle};

/// A confirmed primary write plus its background registration.
#[derive(Debug)]
pub struct WriteResult {
    pub doc_ref: DocumentRef,
    /// Dropping this detaches the registration; it still runs.
    pub registration: RegistrationTask,
}

/// Writes documents and registers their collections.
#[derive(Clone)]
pub struct SmartWriter {
    store: StoreHandle,
    registry: Registry,
}

impl SmartWriter {
    pub fn new(store: StoreHandle, config: &RegistryConfig) -> Self {
        let registry = Registry::new(store.clone(), config);
        Self { store, registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Create a document with a generated id.
    #[tracing::instrument(skip(self, data))]
    pub async fn add_doc(&self, collection: &str, data: Value) -> Result<WriteResult, StorageError> {
        let _timer = LatencyTimer::new("add");
        let doc_ref = observe("add", self.store.add(collection, data).await)?;
        Ok(self.confirmed(doc_ref))
    }

    /// Create or overwrite the document `collection/id`.
    #[tracing::instrument(skip(self, data))]
    pub async fn set_doc(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        options: SetOptions,
    ) -> Result<WriteResult, StorageError> {
        let _timer = LatencyTimer::new("set");
        let doc_ref = DocumentRef::new(collection, id);
        observe("set", self.store.set(&doc_ref, data, options).await)?;
        Ok(self.confirmed(doc_ref))
    }

    fn confirmed(&self, doc_ref: DocumentRef) -> WriteResult {
        let registration = self.registry.register_detached(&doc_ref.collection);
        WriteResult { doc_ref, registration }
    }
}

/// Count and log the outcome of a primary operation, passing it through.
pub(crate) fn observe<T>(operation: &str, result: Result<T, StorageError>) -> Result<T, StorageError> {
    match &result {
        Ok(_) => metrics::record_operation(operation, "success"),
        Err(e) => {
            debug!(operation, error = %e, "primary operation failed");
            metrics::record_operation(operation, "error");
            metrics::record_error(operation, e.code());
        }
    }
    result
}
