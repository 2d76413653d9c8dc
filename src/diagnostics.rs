// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Connectivity test against the document store.
//!
//! Writes a probe document to `<diagnostics_collection>/test_<uid>`, reads it
//! back and deletes it, all within a fixed wall-clock budget
//! (`connectivity_timeout_ms`, 5 s by default). Running out of time is
//! reported as [`DiagnosticError::TimeoutExceeded`], separate from anything
//! the store itself reported.

use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::document::{now_millis, DocumentRef};
use crate::metrics;
use crate::smart_write::SmartWriter;
use crate::storage::traits::{SetOptions, StorageError};

#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("TIMEOUT_EXCEEDED after {0:?}")]
    TimeoutExceeded(Duration),
    #[error("document '{0}' was written but could not be read back")]
    ReadBackMissing(String),
    #[error(transparent)]
    Store(#[from] StorageError),
}

impl DiagnosticError {
    /// Message suitable for showing to the person running the test.
    #[must_use]
    pub fn user_message(&self, budget: Duration) -> String {
        match self {
            Self::TimeoutExceeded(_) => format!(
                "Timed out after {}s. Check the connection and that the document store is enabled.",
                budget.as_secs_f64()
            ),
            Self::ReadBackMissing(_) => {
                "The probe document was written but could not be read back (latency or consistency issue).".to_string()
            }
            Self::Store(StorageError::PermissionDenied(_)) => {
                "Permission denied. Security rules block writes to the diagnostics collection.".to_string()
            }
            Self::Store(StorageError::Unavailable(_)) => {
                "Store unavailable (offline). Check the network connection.".to_string()
            }
            Self::Store(StorageError::NotFound(_)) => "Collection or document not found.".to_string(),
            Self::Store(_) => "Unknown document store error.".to_string(),
        }
    }

    /// Technical detail; for permission errors, a hint for the rule to add.
    #[must_use]
    pub fn details(&self, collection: &str) -> String {
        match self {
            Self::Store(StorageError::PermissionDenied(_)) => format!(
                "Allow authenticated read/write on '{}/{{docId}}' in the store's security rules.",
                collection
            ),
            other => other.to_string(),
        }
    }
}

/// Outcome of a connectivity test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Diagnostics {
    writer: SmartWriter,
    collection: String,
    timeout: Duration,
}

impl Diagnostics {
    pub fn new(writer: SmartWriter, config: &RegistryConfig) -> Self {
        Self {
            writer,
            collection: config.diagnostics_collection.clone(),
            timeout: config.connectivity_timeout(),
        }
    }

    /// Run the write/read/delete probe and summarize it. Never fails.
    #[tracing::instrument(skip(self))]
    pub async fn test_connection(&self, uid: &str) -> ConnectionReport {
        match self.probe(uid).await {
            Ok(report) => {
                info!(latency_ms = ?report.latency_ms, "connectivity test passed");
                report
            }
            Err(e) => {
                warn!(error = %e, "connectivity test failed");
                ConnectionReport {
                    success: false,
                    message: e.user_message(self.timeout),
                    path: None,
                    latency_ms: None,
                    error: Some(e.details(&self.collection)),
                }
            }
        }
    }

    /// The probe raced against the timeout.
    pub async fn probe(&self, uid: &str) -> Result<ConnectionReport, DiagnosticError> {
        match tokio::time::timeout(self.timeout, self.write_read_delete(uid)).await {
            Ok(result) => result,
            Err(_) => {
                metrics::record_timeout("connectivity_test");
                Err(DiagnosticError::TimeoutExceeded(self.timeout))
            }
        }
    }

    async fn write_read_delete(&self, uid: &str) -> Result<ConnectionReport, DiagnosticError> {
        let doc_ref = DocumentRef::new(self.collection.as_str(), format!("test_{}", uid));
        let payload = json!({
            "check": "connectivity_test",
            "timestamp": now_millis(),
            "uid": uid,
            "client": "collection-registry",
        });

        let start = Instant::now();
        // Registration runs detached; the probe does not wait for it.
        let written = self
            .writer
            .set_doc(&doc_ref.collection, &doc_ref.id, payload, SetOptions::default())
            .await?;
        drop(written.registration);

        let store = self.writer.store();
        if store.get(&doc_ref).await?.is_none() {
            return Err(DiagnosticError::ReadBackMissing(doc_ref.path()));
        }
        store.delete(&doc_ref).await?;

        Ok(ConnectionReport {
            success: true,
            message: "Connectivity test passed (write/read/delete OK)".to_string(),
            path: Some(doc_ref.path()),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        })
    }
}
