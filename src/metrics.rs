// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for doc-store.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter
//! (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `doc_store_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `component`: store, session
//! - `operation`: get, insert, update, delete, save
//! - `status`: success, cache_hit, fetch, soft_fail, error, conflict_exhausted

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record a store operation outcome.
pub fn record_operation(component: &str, operation: &str, status: &str) {
    counter!(
        "doc_store_operations_total",
        "component" => component.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency.
pub fn record_latency(component: &str, operation: &str, duration: Duration) {
    histogram!(
        "doc_store_operation_seconds",
        "component" => component.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a write conflict (each retry attempt counts once).
pub fn record_conflict(collection: &str) {
    counter!(
        "doc_store_write_conflicts_total",
        "collection" => collection.to_string()
    )
    .increment(1);
}

/// Set current cache entry count.
pub fn set_cache_entries(count: usize) {
    gauge!("doc_store_cache_entries").set(count as f64);
}

/// Set cumulative cache hit rate (0.0 - 1.0).
pub fn set_cache_hit_rate(rate: f64) {
    gauge!("doc_store_cache_hit_rate").set(rate);
}
