//! Metrics and observability utilities
//!
//! Prometheus metrics for the HTTP surface, the Scopus proxy path and the cache.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Paperscope metrics
pub const METRICS_PREFIX: &str = "paperscope";

/// Histogram buckets for outbound Scopus calls (in seconds)
pub const REMOTE_LATENCY_BUCKETS: &[f64] = &[
    0.050, 0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.00, 30.00,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_searches_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of paper searches"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end search latency in seconds"
    );

    describe_histogram!(
        format!("{}_search_results", METRICS_PREFIX),
        Unit::Count,
        "Papers returned per search"
    );

    describe_counter!(
        format!("{}_remote_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total Scopus page requests"
    );

    describe_histogram!(
        format!("{}_remote_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Scopus page request latency in seconds"
    );

    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a completed search
pub fn record_search(duration_secs: f64, source: &str, result_count: usize) {
    counter!(
        format!("{}_searches_total", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .record(duration_secs);

    histogram!(
        format!("{}_search_results", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .record(result_count as f64);
}

/// Helper to record one outbound page request
pub fn record_remote_call(duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_remote_calls_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    histogram!(format!("{}_remote_call_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in REMOTE_LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
        assert!(REMOTE_LATENCY_BUCKETS.contains(&30.00));
    }

    #[test]
    fn test_recorders_without_exporter() {
        let metrics = RequestMetrics::start("POST", "/api/search");
        metrics.finish(200);
        record_search(0.2, "remote", 25);
        record_remote_call(0.1, true);
        record_cache(false, "search");
    }
}
