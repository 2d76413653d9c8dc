//! # Collection Registry
//!
//! A best-effort side index of the collections that exist in a document
//! store, for stores whose client APIs cannot enumerate collections.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SmartWriter / DocumentAdmin             │
//! │  • Primary write to the store (errors go to the caller)    │
//! │  • On success: spawn a detached registration               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ (fire-and-forget)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Registry                           │
//! │  • Skips blank names and its own collection                │
//! │  • Logs and drops failures, never retries them             │
//! │  • Listing = defaults ∪ registered, sorted, never fails    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              RegistryStore: _app_registry/manifest          │
//! │  • Atomic set-union upsert when the store has one          │
//! │  • Otherwise versioned read + conditional write + retry    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use collection_registry::{InMemoryStore, RegistryConfig, SmartWriter};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RegistryConfig::default();
//!     let writer = SmartWriter::new(Arc::new(InMemoryStore::new()), &config);
//!
//!     // The write result depends only on the primary write
//!     let written = writer.add_doc("orders", json!({"total": 42})).await.expect("write failed");
//!     written.registration.settled().await;
//!
//!     let names = writer.registry().list_known_collections().await;
//!     assert_eq!(names, vec!["_app_registry", "orders", "users"]);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`registry`]: The [`Registry`] handle, manifest merge rules and listing
//! - [`smart_write`]: Writes that register their collection in the background
//! - [`admin`]: Browse/create/update/delete documents of a collection
//! - [`diagnostics`]: Write/read/delete connectivity test with a timeout
//! - [`storage`]: The [`DocumentStore`] trait and an in-memory store
//! - [`resilience`]: Backoff used by the optimistic manifest merge

pub mod admin;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod metrics;
pub mod registry;
pub mod resilience;
pub mod smart_write;
pub mod storage;

pub use admin::DocumentAdmin;
pub use config::RegistryConfig;
pub use diagnostics::{ConnectionReport, DiagnosticError, Diagnostics};
pub use document::{Document, DocumentRef};
pub use metrics::LatencyTimer;
pub use registry::listing::KnownCollections;
pub use registry::manifest::{Manifest, SkipReason};
pub use registry::store::{MergePath, RegistryStore};
pub use registry::{RegisterOutcome, Registry, RegistrationTask, RegistryResult, MANIFEST_DOC, REGISTRY_COLLECTION};
pub use resilience::retry::RetryConfig;
pub use smart_write::{SmartWriter, WriteResult};
pub use storage::memory::InMemoryStore;
pub use storage::traits::{DocumentStore, SetOptions, StorageError, StoreHandle};
