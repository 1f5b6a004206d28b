//! Metrics collection for functions-service.
//!
//! Callable invocations and provider calls are counted alongside the
//! standard HTTP metrics recorded by the shared middleware.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static FUNCTION_CALLS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_CALLS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize metrics collection.
pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    let registry = Registry::new();

    let function_calls_counter = IntCounterVec::new(
        Opts::new(
            "function_calls_total",
            "Total callable invocations by function and status",
        ),
        &["function", "status"],
    )
    .expect("Failed to create function_calls_total metric");

    let provider_calls_counter = IntCounterVec::new(
        Opts::new(
            "provider_calls_total",
            "Total provider API calls by provider and status",
        ),
        &["provider", "status"],
    )
    .expect("Failed to create provider_calls_total metric");

    registry
        .register(Box::new(function_calls_counter.clone()))
        .expect("Failed to register function_calls_total");
    registry
        .register(Box::new(provider_calls_counter.clone()))
        .expect("Failed to register provider_calls_total");

    PROMETHEUS_REGISTRY
        .set(registry)
        .expect("Failed to set prometheus registry");
    FUNCTION_CALLS_TOTAL
        .set(function_calls_counter)
        .expect("Failed to set function_calls_total");
    PROVIDER_CALLS_TOTAL
        .set(provider_calls_counter)
        .expect("Failed to set provider_calls_total");
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    // Append custom prometheus metrics
    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Record a callable invocation.
pub fn record_function_call(function: &str, status: &str) {
    if let Some(counter) = FUNCTION_CALLS_TOTAL.get() {
        counter.with_label_values(&[function, status]).inc();
    }
}

/// Record a provider API call.
pub fn record_provider_call(provider: &str, status: &str) {
    if let Some(counter) = PROVIDER_CALLS_TOTAL.get() {
        counter.with_label_values(&[provider, status]).inc();
    }
}
