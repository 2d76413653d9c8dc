// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collection registry.
//!
//! Document stores rarely let clients enumerate collections, so the registry
//! keeps a side index: a single manifest document at
//! `_app_registry/manifest` whose `collectionNames` array grows as
//! collections are written to.
//!
//! The registry is best-effort. Registration failures are logged and
//! dropped, never retried and never reported to the write that triggered
//! them; a missed name is picked up again by the next successful write to
//! that collection or by a manual registration. Listing degrades to the
//! configured defaults when the manifest cannot be read.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use collection_registry::{InMemoryStore, Registry, RegistryConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry = Registry::new(Arc::new(InMemoryStore::new()), &RegistryConfig::default());
//!
//! registry.register_collection("orders").await;
//! let names = registry.list_known_collections().await;
//! assert_eq!(names, vec!["_app_registry", "orders", "users"]);
//! # }
//! ```

pub mod listing;
pub mod manifest;
pub mod store;

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::metrics;
use crate::storage::traits::{StorageError, StoreHandle};
use manifest::{registrable_name, SkipReason};
use store::{MergePath, RegistryStore};

/// Collection holding the manifest. Never registered into itself.
pub const REGISTRY_COLLECTION: &str = "_app_registry";
/// Document id of the manifest inside [`REGISTRY_COLLECTION`].
pub const MANIFEST_DOC: &str = "manifest";

/// Result of [`Registry::get_registered_collections`].
///
/// `success` stays `true` when the manifest could not be read; the cause is
/// carried in `message` and `collections` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryResult {
    pub success: bool,
    pub collections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What a registration attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Merged(MergePath),
    Skipped(SkipReason),
}

/// Handle to the registry for one store.
///
/// Cheap to clone; clones share the store handle.
#[derive(Clone)]
pub struct Registry {
    store: RegistryStore,
    defaults: Arc<[String]>,
}

impl Registry {
    pub fn new(store: StoreHandle, config: &RegistryConfig) -> Self {
        Self {
            store: RegistryStore::new(store, config.merge_retry()),
            defaults: config.default_collections.clone().into(),
        }
    }

    /// Collections that are always listed.
    #[must_use]
    pub fn default_collections(&self) -> &[String] {
        &self.defaults
    }

    /// Register `name`, reporting store failures to the caller.
    ///
    /// Blank, invalid and reserved names are skipped without touching the store.
    pub async fn try_register(&self, name: &str) -> Result<RegisterOutcome, StorageError> {
        let name = match registrable_name(name) {
            Ok(name) => name,
            Err(reason) => return Ok(RegisterOutcome::Skipped(reason)),
        };
        let path = self.store.merge(name).await?;
        Ok(RegisterOutcome::Merged(path))
    }

    /// Best-effort registration: failures are logged and discarded.
    #[tracing::instrument(skip(self))]
    pub async fn register_collection(&self, name: &str) {
        match self.try_register(name).await {
            Ok(RegisterOutcome::Merged(path)) => {
                debug!(%path, "collection registered");
                metrics::record_registration("merged");
            }
            Ok(RegisterOutcome::Skipped(reason)) => {
                debug!(%reason, "registration skipped");
                metrics::record_registration("skipped");
            }
            Err(e) => {
                warn!(
                    error = %e,
                    code = e.code(),
                    "failed to register collection; check store permissions"
                );
                metrics::record_registration("failed");
            }
        }
    }

    /// Launch a registration on a detached task.
    ///
    /// Must be called from within a tokio runtime. Names that would be
    /// skipped do not spawn anything.
    pub fn register_detached(&self, name: &str) -> RegistrationTask {
        let collection = name.trim().to_string();
        if let Err(reason) = registrable_name(name) {
            debug!(collection = %collection, %reason, "registration skipped");
            metrics::record_registration("skipped");
            return RegistrationTask { collection, handle: None };
        }

        let registry = self.clone();
        let task_name = collection.clone();
        let handle = tokio::spawn(async move {
            registry.register_collection(&task_name).await;
        });
        RegistrationTask {
            collection,
            handle: Some(handle),
        }
    }

    /// All registered collection names, sorted.
    ///
    /// Never fails: an unreadable manifest yields an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn get_registered_collections(&self) -> RegistryResult {
        match self.store.read().await {
            Ok(Some(manifest)) => {
                metrics::record_listing("ok");
                RegistryResult {
                    success: true,
                    collections: manifest.sorted_names(),
                    message: None,
                }
            }
            Ok(None) => {
                metrics::record_listing("empty");
                RegistryResult {
                    success: true,
                    collections: Vec::new(),
                    message: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "registry unreadable, listing defaults only");
                metrics::record_listing("degraded");
                RegistryResult {
                    success: true,
                    collections: Vec::new(),
                    message: Some(e.to_string()),
                }
            }
        }
    }

    /// Defaults plus registered names, deduplicated and sorted.
    pub async fn list_known_collections(&self) -> Vec<String> {
        let registered = self.get_registered_collections().await;
        listing::known_collections(&self.defaults, &registered.collections)
    }
}

/// A registration running on a detached task.
///
/// Dropping it leaves the task running. [`settled`](Self::settled) waits for
/// it; the outcome was already logged by the task, so there is nothing to return.
#[derive(Debug)]
pub struct RegistrationTask {
    collection: String,
    handle: Option<JoinHandle<()>>,
}

impl RegistrationTask {
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// `false` when the name was skipped and no task was spawned.
    #[must_use]
    pub fn was_spawned(&self) -> bool {
        self.handle.is_some()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the background registration to finish.
    pub async fn settled(self) {
        if let Some(handle) = self.handle {
            if let Err(e) = handle.await {
                warn!(collection = %self.collection, error = %e, "registration task aborted");
            }
        }
    }
}
