//! Prometheus metrics for interview-service.
//!
//! Provides gRPC and provider-level metrics, scraped from `GET /metrics` on
//! the health listener.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};
use std::time::Instant;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// gRPC metrics
pub static GRPC_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GRPC_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GRPC_REQUESTS_IN_FLIGHT: OnceLock<IntGaugeVec> = OnceLock::new();

// Provider metrics
pub static GENAI_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENAI_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GENAI_PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    static INIT: Once = Once::new();
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let grpc_requests_total = IntCounterVec::new(
        Opts::new("grpc_requests_total", "Total number of gRPC requests"),
        &["method", "status"],
    )
    .expect("Failed to create grpc_requests_total metric");

    let grpc_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "grpc_request_duration_seconds",
            "gRPC request duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["method"],
    )
    .expect("Failed to create grpc_request_duration_seconds metric");

    let grpc_in_flight = IntGaugeVec::new(
        Opts::new(
            "grpc_requests_in_flight",
            "Number of gRPC requests currently being processed",
        ),
        &["method"],
    )
    .expect("Failed to create grpc_requests_in_flight metric");

    // type: input, output
    let genai_tokens = IntCounterVec::new(
        Opts::new("genai_tokens_total", "Total tokens processed"),
        &["model", "type"],
    )
    .expect("Failed to create genai_tokens_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "genai_provider_latency_seconds",
            "AI provider API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider", "model"],
    )
    .expect("Failed to create genai_provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new("genai_provider_errors_total", "Total AI provider errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create genai_provider_errors_total metric");

    registry
        .register(Box::new(grpc_requests_total.clone()))
        .expect("Failed to register grpc_requests_total");
    registry
        .register(Box::new(grpc_request_duration.clone()))
        .expect("Failed to register grpc_request_duration_seconds");
    registry
        .register(Box::new(grpc_in_flight.clone()))
        .expect("Failed to register grpc_requests_in_flight");
    registry
        .register(Box::new(genai_tokens.clone()))
        .expect("Failed to register genai_tokens_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register genai_provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register genai_provider_errors_total");

    let _ = REGISTRY.set(registry);
    let _ = GRPC_REQUESTS_TOTAL.set(grpc_requests_total);
    let _ = GRPC_REQUEST_DURATION_SECONDS.set(grpc_request_duration);
    let _ = GRPC_REQUESTS_IN_FLIGHT.set(grpc_in_flight);
    let _ = GENAI_TOKENS_TOTAL.set(genai_tokens);
    let _ = GENAI_PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = GENAI_PROVIDER_ERRORS_TOTAL.set(provider_errors);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a completed gRPC request.
pub fn record_grpc_request(method: &str, status: &str, duration_secs: f64) {
    if let Some(counter) = GRPC_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, status]).inc();
    }
    if let Some(histogram) = GRPC_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method])
            .observe(duration_secs);
    }
}

/// Increment gRPC requests in flight.
pub fn inc_grpc_in_flight(method: &str) {
    if let Some(gauge) = GRPC_REQUESTS_IN_FLIGHT.get() {
        gauge.with_label_values(&[method]).inc();
    }
}

/// Decrement gRPC requests in flight.
pub fn dec_grpc_in_flight(method: &str) {
    if let Some(gauge) = GRPC_REQUESTS_IN_FLIGHT.get() {
        gauge.with_label_values(&[method]).dec();
    }
}

/// Tracks one gRPC call from start to finish.
///
/// Holding the guard counts the call as in flight. Dropping it without
/// [`GrpcCallGuard::finish`] (the handler future was cancelled) records the
/// call with status `cancelled`.
pub struct GrpcCallGuard {
    method: &'static str,
    start: Instant,
    recorded: bool,
}

impl GrpcCallGuard {
    pub fn start(method: &'static str) -> Self {
        inc_grpc_in_flight(method);
        Self {
            method,
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Record the outcome of the call.
    pub fn finish(mut self, status: &str) {
        record_grpc_request(self.method, status, self.start.elapsed().as_secs_f64());
        self.recorded = true;
    }
}

impl Drop for GrpcCallGuard {
    fn drop(&mut self) {
        dec_grpc_in_flight(self.method);
        if !self.recorded {
            tracing::warn!(method = self.method, "gRPC call cancelled before completion");
            record_grpc_request(
                self.method,
                "cancelled",
                self.start.elapsed().as_secs_f64(),
            );
        }
    }
}

/// Record token usage for one provider call.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = GENAI_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = GENAI_PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = GENAI_PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}
