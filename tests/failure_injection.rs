//! Failure injection tests for the registry and smart writes.
//!
//! A `FailingStore` wrapper injects errors into either the primary document
//! path or the registry path (anything touching `_app_registry`), so each
//! failure-isolation rule can be checked on its own.
//!
//! # Running
//! ```bash
//! cargo test --test failure_injection
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use collection_registry::{
    Document, DocumentAdmin, DocumentRef, DocumentStore, InMemoryStore, RegisterOutcome, Registry,
    RegistryConfig, SetOptions, SmartWriter, StorageError, REGISTRY_COLLECTION,
};

// =============================================================================
// Failing Store Wrapper - Path-Scoped Error Injection
// =============================================================================

/// Wraps an [`InMemoryStore`] and fails selected calls.
///
/// Registry calls are the ones addressed to `_app_registry`; everything else
/// is primary traffic.
pub struct FailingStore {
    inner: InMemoryStore,
    fail_primary_writes: AtomicBool,
    fail_registry_writes: AtomicBool,
    fail_registry_reads: AtomicBool,
    registry_write_calls: AtomicU64,
    native_union: bool,
    error: StorageError,
}

impl FailingStore {
    pub fn new(inner: InMemoryStore, error: StorageError) -> Self {
        Self {
            inner,
            fail_primary_writes: AtomicBool::new(false),
            fail_registry_writes: AtomicBool::new(false),
            fail_registry_reads: AtomicBool::new(false),
            registry_write_calls: AtomicU64::new(0),
            native_union: true,
            error,
        }
    }

    /// Report `Unsupported` for `union_upsert`, forcing the optimistic merge.
    pub fn without_union(mut self) -> Self {
        self.native_union = false;
        self
    }

    pub fn break_primary_writes(&self) {
        self.fail_primary_writes.store(true, Ordering::SeqCst);
    }

    pub fn break_registry_writes(&self) {
        self.fail_registry_writes.store(true, Ordering::SeqCst);
    }

    pub fn break_registry_reads(&self) {
        self.fail_registry_reads.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.fail_primary_writes.store(false, Ordering::SeqCst);
        self.fail_registry_writes.store(false, Ordering::SeqCst);
        self.fail_registry_reads.store(false, Ordering::SeqCst);
    }

    pub fn registry_write_calls(&self) -> u64 {
        self.registry_write_calls.load(Ordering::SeqCst)
    }

    fn is_registry(collection: &str) -> bool {
        collection == REGISTRY_COLLECTION
    }

    fn check_write(&self, collection: &str) -> Result<(), StorageError> {
        if Self::is_registry(collection) {
            self.registry_write_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_registry_writes.load(Ordering::SeqCst) {
                return Err(self.error.clone());
            }
        } else if self.fail_primary_writes.load(Ordering::SeqCst) {
            return Err(self.error.clone());
        }
        Ok(())
    }

    fn check_read(&self, collection: &str) -> Result<(), StorageError> {
        if Self::is_registry(collection) && self.fail_registry_reads.load(Ordering::SeqCst) {
            return Err(self.error.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn add(&self, collection: &str, data: Value) -> Result<DocumentRef, StorageError> {
        self.check_write(collection)?;
        self.inner.add(collection, data).await
    }

    async fn set(&self, doc: &DocumentRef, data: Value, options: SetOptions) -> Result<(), StorageError> {
        self.check_write(&doc.collection)?;
        self.inner.set(doc, data, options).await
    }

    async fn get(&self, doc: &DocumentRef) -> Result<Option<Document>, StorageError> {
        self.check_read(&doc.collection)?;
        self.inner.get(doc).await
    }

    async fn update(&self, doc: &DocumentRef, data: Value) -> Result<(), StorageError> {
        self.check_write(&doc.collection)?;
        self.inner.update(doc, data).await
    }

    async fn delete(&self, doc: &DocumentRef) -> Result<(), StorageError> {
        self.check_write(&doc.collection)?;
        self.inner.delete(doc).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        self.check_read(collection)?;
        self.inner.list(collection).await
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
        self.check_write(&doc.collection)?;
        self.inner.union_upsert(doc, field, values, fields).await
    }

    async fn put_if_version(&self, doc: &DocumentRef, data: Value, expected: u64) -> Result<u64, StorageError> {
        self.check_write(&doc.collection)?;
        self.inner.put_if_version(doc, data, expected).await
    }
}

fn denied() -> StorageError {
    StorageError::PermissionDenied("missing or insufficient permissions".into())
}

fn failing(error: StorageError) -> Arc<FailingStore> {
    Arc::new(FailingStore::new(InMemoryStore::new(), error))
}

fn writer(store: &Arc<FailingStore>) -> SmartWriter {
    SmartWriter::new(store.clone(), &RegistryConfig::default())
}

// =============================================================================
// Registry-path failures never reach the caller
// =============================================================================

#[tokio::test]
async fn failure_registry_write_does_not_fail_smart_write() {
    let store = failing(denied());
    store.break_registry_writes();
    let writer = writer(&store);

    let result = writer
        .add_doc("orders", json!({"total": 5}))
        .await
        .expect("primary write must succeed even when registration fails");
    result.registration.settled().await;

    // Primary data is intact
    let stored = store.get(&result.doc_ref).await.unwrap().unwrap();
    assert_eq!(stored.data["total"], 5);

    // Registration was attempted, failed, and left the manifest absent
    assert_eq!(store.registry_write_calls(), 1);
    assert!(writer.registry().get_registered_collections().await.collections.is_empty());
}

#[tokio::test]
async fn failure_registry_write_is_not_retried() {
    let store = failing(denied());
    store.break_registry_writes();
    let writer = writer(&store);

    let result = writer.set_doc("orders", "o1", json!({}), SetOptions::default()).await.unwrap();
    result.registration.settled().await;

    assert_eq!(store.registry_write_calls(), 1);
}

#[tokio::test]
async fn failure_missed_registration_heals_on_next_write() {
    let store = failing(denied());
    store.break_registry_writes();
    let writer = writer(&store);

    writer.add_doc("orders", json!({})).await.unwrap().registration.settled().await;
    assert!(writer.registry().get_registered_collections().await.collections.is_empty());

    store.heal();
    writer.add_doc("orders", json!({})).await.unwrap().registration.settled().await;
    assert_eq!(writer.registry().get_registered_collections().await.collections, vec!["orders"]);
}

#[tokio::test]
async fn failure_try_register_surfaces_the_cause() {
    let store = failing(denied());
    store.break_registry_writes();
    let registry = Registry::new(store.clone(), &RegistryConfig::default());

    let err = registry.try_register("orders").await.unwrap_err();
    assert_eq!(err.code(), "permission-denied");

    // The best-effort variant swallows the same failure
    registry.register_collection("orders").await;
    assert_eq!(store.registry_write_calls(), 2);
}

#[tokio::test]
async fn failure_optimistic_merge_rejection_is_swallowed() {
    let store = Arc::new(FailingStore::new(InMemoryStore::new(), denied()).without_union());
    store.break_registry_writes();
    let writer = writer(&store);

    let result = writer.add_doc("orders", json!({})).await.unwrap();
    result.registration.settled().await;

    // One conditional write, rejected; a permission error is not a conflict, so no retry
    assert_eq!(store.registry_write_calls(), 1);
    assert!(store.get(&result.doc_ref).await.unwrap().is_some());
}

#[tokio::test]
async fn optimistic_merge_registers_when_healthy() {
    let store = Arc::new(FailingStore::new(InMemoryStore::new(), denied()).without_union());
    let writer = writer(&store);

    writer.add_doc("orders", json!({})).await.unwrap().registration.settled().await;
    writer.add_doc("users", json!({})).await.unwrap().registration.settled().await;

    assert_eq!(
        writer.registry().get_registered_collections().await.collections,
        vec!["orders", "users"]
    );
}

// =============================================================================
// Primary-path failures propagate and skip registration
// =============================================================================

#[tokio::test]
async fn failure_primary_write_propagates_and_skips_registration() {
    let store = failing(denied());
    store.break_primary_writes();
    let writer = writer(&store);

    let err = writer.add_doc("orders", json!({"total": 5})).await.unwrap_err();
    assert_eq!(err, denied());

    let err = writer
        .set_doc("orders", "o1", json!({}), SetOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "permission-denied");

    tokio::task::yield_now().await;
    assert_eq!(store.registry_write_calls(), 0);
}

#[tokio::test]
async fn failure_unavailable_store_propagates_cause() {
    let store = failing(StorageError::Unavailable("offline".into()));
    store.break_primary_writes();
    let admin = DocumentAdmin::new(writer(&store));

    let err = admin.create_document("orders", json!({})).await.unwrap_err();
    assert_eq!(err, StorageError::Unavailable("offline".into()));
    assert_eq!(store.registry_write_calls(), 0);
}

// =============================================================================
// Listing degrades instead of failing
// =============================================================================

#[tokio::test]
async fn failure_registry_read_degrades_to_defaults() {
    let store = failing(denied());
    let registry = Registry::new(store.clone(), &RegistryConfig::default());
    registry.register_collection("orders").await;

    store.break_registry_reads();
    let result = registry.get_registered_collections().await;
    assert!(result.success);
    assert!(result.collections.is_empty());
    assert!(result.message.unwrap().contains("Permission denied"));

    assert_eq!(registry.list_known_collections().await, vec!["_app_registry", "users"]);
}

#[tokio::test]
async fn failure_registry_read_then_recovery() {
    let store = failing(denied());
    store.break_registry_reads();
    let registry = Registry::new(store.clone(), &RegistryConfig::default());

    // Native union writes do not need a read
    assert!(matches!(registry.try_register("orders").await, Ok(RegisterOutcome::Merged(_))));
    assert_eq!(registry.list_known_collections().await, vec!["_app_registry", "users"]);

    store.heal();
    assert_eq!(registry.list_known_collections().await, vec!["_app_registry", "orders", "users"]);
}
