//! Prometheus Metrics Module
//!
//! Pre-registered metrics for production observability.
//! All metrics use lock-free atomics for minimal hot-path overhead.

use lazy_static::lazy_static;
use prometheus::{
    opts, register_gauge, register_histogram, register_histogram_vec, register_int_counter_vec,
    Encoder, Gauge, Histogram, HistogramVec, IntCounterVec, TextEncoder,
};

use crate::resilience::CircuitState;

lazy_static! {
    // --- Upstream Metrics ---

    /// Upstream requests by endpoint and outcome
    pub static ref UPSTREAM_REQUESTS: IntCounterVec = register_int_counter_vec!(
        opts!("macrovivo_upstream_requests_total", "Upstream API requests"),
        &["endpoint", "outcome"]
    ).expect("FATAL: Failed to register UPSTREAM_REQUESTS metric - check for duplicate registration");

    /// Upstream request latency in seconds
    pub static ref UPSTREAM_LATENCY: HistogramVec = register_histogram_vec!(
        "macrovivo_upstream_latency_seconds",
        "Upstream request latency",
        &["endpoint"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]
    ).expect("FATAL: Failed to register UPSTREAM_LATENCY metric - check for duplicate registration");

    /// Retry attempts by endpoint
    pub static ref UPSTREAM_RETRIES: IntCounterVec = register_int_counter_vec!(
        opts!("macrovivo_upstream_retries_total", "Upstream retry attempts"),
        &["endpoint"]
    ).expect("FATAL: Failed to register UPSTREAM_RETRIES metric - check for duplicate registration");

    // --- Cache Metrics ---

    /// Cache probes by cache name and event (hit, miss, error_hit)
    pub static ref CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        opts!("macrovivo_cache_events_total", "Cache probe outcomes"),
        &["cache", "event"]
    ).expect("FATAL: Failed to register CACHE_EVENTS metric - check for duplicate registration");

    // --- Circuit Breaker Metrics ---

    /// Circuit breaker state (0=closed, 1=open, 2=half_open)
    pub static ref CIRCUIT_BREAKER_STATE: Gauge = register_gauge!(
        opts!("macrovivo_circuit_breaker_state", "Circuit breaker state (0=closed, 1=open, 2=half_open)")
    ).expect("FATAL: Failed to register CIRCUIT_BREAKER_STATE metric - check for duplicate registration");

    /// Circuit breaker trips
    pub static ref CIRCUIT_BREAKER_TRIPS: IntCounterVec = register_int_counter_vec!(
        opts!("macrovivo_circuit_breaker_trips_total", "Circuit breaker trips"),
        &["endpoint"]
    ).expect("FATAL: Failed to register CIRCUIT_BREAKER_TRIPS metric - check for duplicate registration");

    // --- Fallback Metrics ---

    /// Fallback store reads by outcome (hit, miss, error)
    pub static ref FALLBACK_READS: IntCounterVec = register_int_counter_vec!(
        opts!("macrovivo_fallback_reads_total", "Fallback store reads"),
        &["outcome"]
    ).expect("FATAL: Failed to register FALLBACK_READS metric - check for duplicate registration");

    // --- Warm Job Metrics ---

    /// Warm job runs by status
    pub static ref WARM_RUNS: IntCounterVec = register_int_counter_vec!(
        opts!("macrovivo_warm_runs_total", "Cache warm job runs"),
        &["status"]
    ).expect("FATAL: Failed to register WARM_RUNS metric - check for duplicate registration");

    /// Series warmed per-variable, by outcome
    pub static ref WARM_SERIES: IntCounterVec = register_int_counter_vec!(
        opts!("macrovivo_warm_series_total", "Per-variable warm outcomes"),
        &["outcome"]
    ).expect("FATAL: Failed to register WARM_SERIES metric - check for duplicate registration");

    /// Warm job duration in seconds
    pub static ref WARM_DURATION: Histogram = register_histogram!(
        "macrovivo_warm_duration_seconds",
        "Cache warm job duration",
        vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    ).expect("FATAL: Failed to register WARM_DURATION metric - check for duplicate registration");
}

/// Record an upstream request outcome
pub fn record_upstream(endpoint: &str, outcome: &str) {
    UPSTREAM_REQUESTS
        .with_label_values(&[endpoint, outcome])
        .inc();
}

/// Record upstream request latency
pub fn record_upstream_latency(endpoint: &str, latency_secs: f64) {
    UPSTREAM_LATENCY
        .with_label_values(&[endpoint])
        .observe(latency_secs);
}

/// Record a retry attempt
pub fn record_retry(endpoint: &str) {
    UPSTREAM_RETRIES.with_label_values(&[endpoint]).inc();
}

/// Record a cache probe outcome
pub fn record_cache_event(cache: &str, event: &str) {
    CACHE_EVENTS.with_label_values(&[cache, event]).inc();
}

/// Update the circuit breaker state gauge
pub fn set_circuit_state(state: CircuitState) {
    CIRCUIT_BREAKER_STATE.set(state as u32 as f64);
}

/// Record a breaker trip (closed/half-open -> open)
pub fn record_breaker_trip(endpoint: &str) {
    CIRCUIT_BREAKER_TRIPS.with_label_values(&[endpoint]).inc();
}

/// Record a fallback store read
pub fn record_fallback_read(outcome: &str) {
    FALLBACK_READS.with_label_values(&[outcome]).inc();
}

/// Get metrics as text for /metrics endpoint
///
/// Handles encoding errors gracefully instead of panicking.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode Prometheus metrics: {}", e);
        return String::new();
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Prometheus metrics buffer is not valid UTF-8: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_upstream() {
        record_upstream("monetarias", "success");
        // Metric should be incremented (we can't easily assert on prometheus counters)
    }

    #[test]
    fn test_circuit_state_gauge_values() {
        set_circuit_state(CircuitState::Open);
        assert_eq!(CIRCUIT_BREAKER_STATE.get(), 1.0);
        set_circuit_state(CircuitState::Closed);
        assert_eq!(CIRCUIT_BREAKER_STATE.get(), 0.0);
    }

    #[test]
    fn test_gather_metrics() {
        // Trigger lazy initialization of at least one metric
        record_upstream("monetarias", "success");

        let output = gather_metrics();
        assert!(
            output.contains("macrovivo") || output.contains("upstream_requests_total"),
            "Expected metrics output to contain 'macrovivo' or 'upstream_requests_total', got: {}",
            &output[..output.len().min(200)]
        );
    }
}
