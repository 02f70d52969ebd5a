//! Observability hook handed to every fetcher.

use std::fmt::Debug;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::upstream::UpstreamKind;

/// Receives the outcome of every fetch step worth reporting.
pub trait FetchObserver: Send + Sync + Debug {
    fn cache_hit(&self, kind: UpstreamKind, key: &str);
    fn cache_miss(&self, kind: UpstreamKind, key: &str);
    fn upstream_succeeded(&self, kind: UpstreamKind, key: &str, elapsed: Duration);
    fn fell_back(&self, kind: UpstreamKind, key: &str, error: &FetchError);
}

/// One-time metrics registration (so series show up on /metrics).
pub fn describe_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "aggregator_cache_hits_total",
            "Fetches answered from the response cache."
        );
        describe_counter!(
            "aggregator_cache_misses_total",
            "Fetches that had to call the upstream."
        );
        describe_counter!(
            "aggregator_fallbacks_total",
            "Fetches that failed and returned fallback data."
        );
        describe_histogram!(
            "aggregator_upstream_fetch_ms",
            "Successful upstream round-trip time in milliseconds."
        );
    });
}

/// Default observer: tracing events plus `metrics` counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl MetricsObserver {
    pub fn new() -> Self {
        describe_metrics();
        Self
    }
}

impl FetchObserver for MetricsObserver {
    fn cache_hit(&self, kind: UpstreamKind, key: &str) {
        debug!(upstream = %kind, key, "cache hit");
        counter!("aggregator_cache_hits_total", "upstream" => kind.as_str()).increment(1);
    }

    fn cache_miss(&self, kind: UpstreamKind, key: &str) {
        debug!(upstream = %kind, key, "cache miss");
        counter!("aggregator_cache_misses_total", "upstream" => kind.as_str()).increment(1);
    }

    fn upstream_succeeded(&self, kind: UpstreamKind, key: &str, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1_000.0;
        info!(upstream = %kind, key, elapsed_ms = ms, "upstream fetch succeeded");
        histogram!("aggregator_upstream_fetch_ms", "upstream" => kind.as_str()).record(ms);
    }

    fn fell_back(&self, kind: UpstreamKind, key: &str, error: &FetchError) {
        warn!(upstream = %kind, key, error = %error, "upstream fetch failed; serving fallback");
        counter!(
            "aggregator_fallbacks_total",
            "upstream" => kind.as_str(),
            "reason" => error.reason()
        )
        .increment(1);
    }
}
