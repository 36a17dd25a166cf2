// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the engagement engine.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the host
//! process chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `engagement_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `store`: counter, durable
//! - `operation`: view, like, read, batch_read, warmup
//! - `status`: success, error, rejected

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record an operation against one of the stores.
pub fn record_operation(store: &str, operation: &str, status: &str) {
    counter!(
        "engagement_operations_total",
        "store" => store.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency.
pub fn record_latency(store: &str, operation: &str, duration: Duration) {
    histogram!(
        "engagement_operation_seconds",
        "store" => store.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a rate-limited request.
pub fn record_rate_limited(action: &str) {
    counter!(
        "engagement_rate_limited_total",
        "action" => action.to_string()
    )
    .increment(1);
}

/// Record a view suppressed by the dedup marker.
pub fn record_view_dedup_hit() {
    counter!("engagement_view_dedup_hits_total").increment(1);
}

/// Record a counted view.
pub fn record_view_counted() {
    counter!("engagement_views_counted_total").increment(1);
}

/// Record a sampled-view analytics row attempt.
pub fn record_sampled_view(status: &str) {
    counter!(
        "engagement_sampled_views_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a like toggle.
pub fn record_like_toggle(target: &str, direction: &str) {
    counter!(
        "engagement_like_toggles_total",
        "target" => target.to_string(),
        "direction" => direction.to_string()
    )
    .increment(1);
}

/// Record a read that fell back to the durable store.
pub fn record_read_fallback(operation: &str) {
    counter!(
        "engagement_read_fallbacks_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// RECONCILE - Async durable-store reconciliation
// ═══════════════════════════════════════════════════════════════════════════

/// Record a reconcile job outcome.
pub fn record_reconcile(job: &str, status: &str) {
    counter!(
        "engagement_reconcile_jobs_total",
        "job" => job.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a reconcile job dropped at enqueue time (queue full).
pub fn record_reconcile_dropped(job: &str) {
    counter!(
        "engagement_reconcile_dropped_total",
        "job" => job.to_string()
    )
    .increment(1);
}

/// Record reconcile attempt latency.
pub fn record_reconcile_latency(job: &str, duration: Duration) {
    histogram!(
        "engagement_reconcile_seconds",
        "job" => job.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Set current reconcile queue depth.
pub fn set_reconcile_queue_depth(depth: usize) {
    gauge!("engagement_reconcile_queue_depth").set(depth as f64);
}

// ═══════════════════════════════════════════════════════════════════════════
// SEARCH - Fallback cascade
// ═══════════════════════════════════════════════════════════════════════════

/// Record a search query execution per tier.
pub fn record_search_query(tier: &str, status: &str) {
    counter!(
        "engagement_search_queries_total",
        "tier" => tier.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record search latency per tier.
pub fn record_search_latency(tier: &str, duration: Duration) {
    histogram!(
        "engagement_search_seconds",
        "tier" => tier.to_string()
    )
    .record(duration.as_secs_f64());
}

// ═══════════════════════════════════════════════════════════════════════════
// BACKEND HEALTH
// ═══════════════════════════════════════════════════════════════════════════

/// Set backend health status (1 = healthy, 0 = unhealthy).
pub fn set_backend_healthy(backend: &str, healthy: bool) {
    gauge!(
        "engagement_backend_healthy",
        "backend" => backend.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}

/// Record a connection/backend error.
pub fn record_connection_error(backend: &str) {
    counter!(
        "engagement_connection_errors_total",
        "backend" => backend.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These verify the API compiles and doesn't panic; exporters are the
    // host's concern.

    #[test]
    fn test_operation_counters() {
        record_operation("counter", "view", "success");
        record_operation("durable", "like", "error");
        record_latency("counter", "view", Duration::from_micros(120));
    }

    #[test]
    fn test_engagement_counters() {
        record_rate_limited("view");
        record_view_dedup_hit();
        record_view_counted();
        record_sampled_view("success");
        record_like_toggle("video", "like");
        record_like_toggle("comment", "unlike");
        record_read_fallback("view_count");
    }

    #[test]
    fn test_reconcile_metrics() {
        record_reconcile("like_create", "success");
        record_reconcile("sampled_view", "failure");
        record_reconcile_dropped("like_delete");
        record_reconcile_latency("like_create", Duration::from_millis(3));
        set_reconcile_queue_depth(17);
    }

    #[test]
    fn test_search_metrics() {
        record_search_query("fuzzy", "success");
        record_search_query("basic", "empty");
        record_search_latency("fuzzy", Duration::from_millis(2));
    }

    #[test]
    fn test_health_metrics() {
        set_backend_healthy("redis", true);
        set_backend_healthy("sql", false);
        record_connection_error("redis");
    }
}
