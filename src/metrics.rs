// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the collection registry.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for installing an exporter.
//!
//! # Metric Naming Convention
//! - `collection_registry_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: add, set, get, update, delete, list, connectivity_test
//! - `status`: success, error
//! - `outcome`: merged, skipped, failed (registrations); ok, empty, degraded (listings)

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record a primary document operation
pub fn record_operation(operation: &str, status: &str) {
    counter!(
        "collection_registry_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "collection_registry_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a registration attempt outcome
pub fn record_registration(outcome: &str) {
    counter!(
        "collection_registry_registrations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a registry listing read
pub fn record_listing(outcome: &str) {
    counter!(
        "collection_registry_listings_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record an operation that ran out of time
pub fn record_timeout(operation: &str) {
    counter!(
        "collection_registry_timeouts_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record an error with its store error code
pub fn record_error(operation: &str, code: &str) {
    counter!(
        "collection_registry_errors_total",
        "operation" => operation.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
