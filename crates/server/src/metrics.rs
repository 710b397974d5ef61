//! Prometheus registry and HTTP request metrics.
//!
//! Engine collectors live in `prealert_core::metrics`; this module adds the
//! HTTP layer and owns the registry served at `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "prealert_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("prealert_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "prealert_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    for metric in prealert_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Normalize a path for metric labels.
///
/// Subscription ids become `{id}`. Owner and community segments are free-form,
/// so they are collapsed to `{owner}` / `{community}` to bound label cardinality.
pub fn normalize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, "{id}");
    let segments: Vec<&str> = path.split('/').collect();

    let mut out = Vec::with_capacity(segments.len());
    let mut placeholder: Option<&str> = None;
    for segment in segments {
        match placeholder.take() {
            Some(name) if !segment.is_empty() => out.push(name),
            _ => out.push(segment),
        }
        placeholder = match segment {
            "subscriptions" => Some("{owner}"),
            "channels" => Some("{community}"),
            _ => None,
        };
    }
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_subscription() {
        let path = "/api/v1/subscriptions/guild:42/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/subscriptions/{owner}/{id}");
    }

    #[test]
    fn test_normalize_path_owner_only() {
        assert_eq!(
            normalize_path("/api/v1/subscriptions/alice"),
            "/api/v1/subscriptions/{owner}"
        );
    }

    #[test]
    fn test_normalize_path_channel() {
        assert_eq!(
            normalize_path("/api/v1/channels/guild"),
            "/api/v1/channels/{community}"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/api/v1/queries"), "/api/v1/queries");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();
        prealert_core::metrics::DEDUP_SKIPS.inc();

        let output = encode_metrics();
        assert!(output.contains("prealert_http_requests_total"));
        assert!(output.contains("prealert_dedup_skips_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
