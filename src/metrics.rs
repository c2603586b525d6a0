// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Prometheus exposition for the ingest pipeline counters. Install once at
/// boot; the ingest module describes its own series on first run.
pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    pub fn init(cache_ttl_secs: u64) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_gauge!(
            "event_cache_ttl_secs",
            "TTL of the session's memoized fetch result."
        );
        gauge!("event_cache_ttl_secs").set(cache_ttl_secs as f64);

        Self { handle }
    }

    /// A router exposing `/metrics` in the Prometheus exposition format,
    /// meant to be merged into the API router.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
