// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for catalog-search.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `catalog_search_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `tier`: local, shared
//! - `result`: hit, miss
//! - `operation`: resolve, merge, compile

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record a rule cache lookup
pub fn record_rule_cache(tier: &str, hit: bool) {
    counter!(
        "catalog_search_rule_cache_total",
        "tier" => tier.to_string(),
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

/// Record a shared cache entry that could not be decoded
pub fn record_cache_decode_error() {
    counter!("catalog_search_rule_cache_decode_errors_total").increment(1);
}

/// Record a recursion cut short because the category was already on the call path
pub fn record_cycle_short_circuit() {
    counter!("catalog_search_cycle_short_circuits_total").increment(1);
}

/// Record operation latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "catalog_search_resolve_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Set the number of fields in the last compiled schema
pub fn set_schema_fields(count: usize) {
    gauge!("catalog_search_schema_fields").set(count as f64);
}

/// Set the current local cache entry count
pub fn set_local_cache_entries(count: usize) {
    gauge!("catalog_search_local_cache_entries").set(count as f64);
}

/// Timer that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
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
