//! Prometheus metrics for the HTTP surface.

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, Encoder,
    HistogramVec, IntCounterVec, Registry, TextEncoder,
};
use std::time::Instant;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec_with_registry!(
        "fabtrack_http_requests_total",
        "Total HTTP requests processed",
        &["method", "path", "status"],
        REGISTRY.clone()
    )
    .expect("metric registration cannot fail with a fresh registry")
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec_with_registry!(
        "fabtrack_http_request_duration_seconds",
        "HTTP request latency",
        &["method", "path"],
        REGISTRY.clone()
    )
    .expect("metric registration cannot fail with a fresh registry")
});

/// Axum middleware recording request counts and latency.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    // Record the route template, not the raw URI, to bound label cardinality
    let path = request
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(elapsed);

    response
}

/// Export metrics in the Prometheus text format.
pub async fn metrics_handler() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("metrics are not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn export_includes_registered_counters() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/v1/status", "200"])
            .inc();
        let text = metrics_handler().await.unwrap();
        assert!(text.contains("fabtrack_http_requests_total"));
    }
}
