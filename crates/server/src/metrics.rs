//! Prometheus metrics for the isoview server.
//!
//! Exposes cache effectiveness, search sources, expression fallbacks and
//! gene index loading.

use crate::cache::CacheKind;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Cache metrics
pub static CACHE_HITS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("isoview_cache_hits_total", "Cache lookups served from memory"),
        &["cache"],
    )
    .expect("metric creation failed")
});

pub static CACHE_MISSES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("isoview_cache_misses_total", "Cache lookups that fell through"),
        &["cache"],
    )
    .expect("metric creation failed")
});

pub static CACHE_CLEARS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("isoview_cache_clears_total", "Explicit full cache clears")
        .expect("metric creation failed")
});

// Search metrics
pub static SEARCH_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "isoview_search_requests_total",
            "Gene searches by the source that answered them",
        ),
        &["source"],
    )
    .expect("metric creation failed")
});

// Expression metrics
pub static EXPRESSION_FALLBACKS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "isoview_expression_fallbacks_total",
        "Expression requests answered without the metadata join",
    )
    .expect("metric creation failed")
});

pub static EXPRESSION_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "isoview_expression_failures_total",
        "Expression requests where both the joined and plain query failed",
    )
    .expect("metric creation failed")
});

// Gene index metrics
pub static GENE_INDEX_LOAD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "isoview_gene_index_load_duration_seconds",
            "Time taken to load the in-memory gene index",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    )
    .expect("metric creation failed")
});

pub static GENE_INDEX_SIZE: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new("isoview_gene_index_size", "Genes held in the in-memory index")
        .expect("metric creation failed")
});

pub static GENE_INDEX_LOAD_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "isoview_gene_index_load_failures_total",
        "Gene index loads that failed",
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(CACHE_HITS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CACHE_MISSES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CACHE_CLEARS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SEARCH_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(EXPRESSION_FALLBACKS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(EXPRESSION_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(GENE_INDEX_LOAD_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(GENE_INDEX_SIZE.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(GENE_INDEX_LOAD_FAILURES.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

pub fn record_cache_hit(kind: CacheKind) {
    CACHE_HITS.with_label_values(&[kind.as_str()]).inc();
}

pub fn record_cache_miss(kind: CacheKind) {
    CACHE_MISSES.with_label_values(&[kind.as_str()]).inc();
}

/// Record which source answered a gene search.
pub fn record_search(source: &str) {
    SEARCH_REQUESTS.with_label_values(&[source]).inc();
}
