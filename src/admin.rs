// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document administration: browse and edit the documents of a collection.
//!
//! Creation goes through [`SmartWriter`] so new collections show up in the
//! registry. Updates and deletes only touch existing documents and leave the
//! registry alone.

use serde_json::Value;

use crate::document::{Document, DocumentRef};
use crate::metrics::LatencyTimer;
use crate::registry::listing::KnownCollections;
use crate::registry::Registry;
use crate::smart_write::{observe, SmartWriter, WriteResult};
use crate::storage::traits::StorageError;

#[derive(Clone)]
pub struct DocumentAdmin {
    writer: SmartWriter,
}

impl DocumentAdmin {
    pub fn new(writer: SmartWriter) -> Self {
        Self { writer }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        self.writer.registry()
    }

    /// Collections to offer, refreshed from the registry.
    pub async fn known_collections(&self) -> KnownCollections {
        let mut view = KnownCollections::from_defaults(self.registry().default_collections());
        view.refresh(self.registry()).await;
        view
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_documents(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        let _timer = LatencyTimer::new("list");
        observe("list", self.writer.store().list(collection).await)
    }

    /// Create a document with a generated id; registers the collection.
    pub async fn create_document(&self, collection: &str, data: Value) -> Result<WriteResult, StorageError> {
        self.writer.add_doc(collection, data).await
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn update_document(&self, collection: &str, id: &str, data: Value) -> Result<(), StorageError> {
        let _timer = LatencyTimer::new("update");
        let doc_ref = DocumentRef::new(collection, id);
        observe("update", self.writer.store().update(&doc_ref, data).await)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StorageError> {
        let _timer = LatencyTimer::new("delete");
        let doc_ref = DocumentRef::new(collection, id);
        observe("delete", self.writer.store().delete(&doc_ref).await)
    }
}
