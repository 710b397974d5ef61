//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ingest (releases received, malformed payloads, stream connections)
//! - Polling (requests, tick duration, effective interval)
//! - Dispatch (matches, dedup skips, deliveries)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Ingest Metrics
// =============================================================================

/// Releases entering the matching pipeline, by source.
pub static RELEASES_RECEIVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "prealert_releases_received_total",
            "Releases fed to the matching pipeline",
        ),
        &["source"], // "stream", "poll", "test"
    )
    .unwrap()
});

/// Feed payloads that failed validation.
pub static MALFORMED_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "prealert_malformed_events_total",
        "Feed payloads dropped because they failed validation",
    )
    .unwrap()
});

/// Stream connection lifecycle events.
pub static STREAM_CONNECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "prealert_stream_connections_total",
            "Stream connection events by outcome",
        ),
        &["outcome"], // "connected", "failed", "closed"
    )
    .unwrap()
});

// =============================================================================
// Polling Metrics
// =============================================================================

/// Upstream poll requests by status.
pub static POLL_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("prealert_poll_requests_total", "Upstream poll requests"),
        &["status"], // "success", "error"
    )
    .unwrap()
});

/// Duration of one poll tick.
pub static POLL_TICK_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "prealert_poll_tick_duration_seconds",
            "Duration of a poll tick across all registered queries",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
    )
    .unwrap()
});

/// Interval currently used between tick starts.
pub static POLL_EFFECTIVE_INTERVAL: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "prealert_poll_effective_interval_seconds",
        "Effective poll interval after applying the request budget",
    )
    .unwrap()
});

/// Registered queries seen by the last tick.
pub static REGISTERED_QUERIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "prealert_registered_queries",
        "Number of queries in the global registry",
    )
    .unwrap()
});

// =============================================================================
// Dispatch Metrics
// =============================================================================

/// Query matches against incoming releases.
pub static QUERY_MATCHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("prealert_query_matches_total", "Query matches").unwrap()
});

/// Matches suppressed by the watermark.
pub static DEDUP_SKIPS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "prealert_dedup_skips_total",
        "Matches skipped because the release was already seen",
    )
    .unwrap()
});

/// Outbound deliveries by result.
pub static DELIVERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("prealert_deliveries_total", "Outbound deliveries"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Owners that could not be routed to any target.
pub static UNROUTABLE_OWNERS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "prealert_unroutable_owners_total",
        "Owners skipped because no delivery target resolved",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Ingest
        Box::new(RELEASES_RECEIVED.clone()),
        Box::new(MALFORMED_EVENTS.clone()),
        Box::new(STREAM_CONNECTIONS.clone()),
        // Polling
        Box::new(POLL_REQUESTS.clone()),
        Box::new(POLL_TICK_DURATION.clone()),
        Box::new(POLL_EFFECTIVE_INTERVAL.clone()),
        Box::new(REGISTERED_QUERIES.clone()),
        // Dispatch
        Box::new(QUERY_MATCHES.clone()),
        Box::new(DEDUP_SKIPS.clone()),
        Box::new(DELIVERIES.clone()),
        Box::new(UNROUTABLE_OWNERS.clone()),
    ]
}
