//! Prometheus metrics for the nightly pipeline and capability runtime.
//!
//! Covers pricing pack builds, reconciliation, derived metrics computation,
//! the capability/pattern runtime, alert evaluation, and circuit breakers.
//!
//! # Example
//!
//! ```ignore
//! use truth_spine_core::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config).expect("failed to initialize metrics");
//!
//! record_pack_build("pack-2026-07-27", "complete", 4.2);
//! ```

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for latency measurements (in seconds).
    pub latency_buckets: Vec<f64>,
    /// Histogram buckets for nightly pipeline step durations (in seconds).
    pub step_duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9090".parse().expect("valid default address"),
            // Latency buckets from 10ms to 10s, for provider calls and capability invocations.
            latency_buckets: vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            // Step duration buckets from 1s to 10min, for the sacred-order pipeline.
            step_duration_buckets: vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Sacred-Order Pipeline Metrics
// ============================================================================

/// Record a nightly sacred-order step outcome.
///
/// * `step` - Step name (e.g. `"build_pack"`, `"reconcile"`, `"compute_metrics"`)
/// * `status` - `"ok"` or `"failed"`
/// * `duration_seconds` - Step wall-clock duration
pub fn record_step(step: &str, status: &str, duration_seconds: f64) {
    counter!(
        "nightly_step_total",
        "step" => step.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("nightly_step_duration_seconds", "step" => step.to_string()).record(duration_seconds);
}

// ============================================================================
// Pricing Pack Metrics
// ============================================================================

/// Record a pricing pack build outcome.
///
/// * `pack_id` - The content-addressed pack id
/// * `status` - `"complete"` or `"partial"`
/// * `duration_seconds` - Build wall-clock duration
pub fn record_pack_build(pack_id: &str, status: &str, duration_seconds: f64) {
    counter!("pack_builds_total", "status" => status.to_string()).increment(1);
    histogram!("pack_build_duration_seconds", "status" => status.to_string()).record(duration_seconds);
    tracing::debug!(pack_id, status, duration_seconds, "pack build recorded");
}

/// Record a provider fetch (price or FX quote).
///
/// * `provider` - Provider name (e.g. `"primary"`, `"secondary"`, `"fx"`)
/// * `status` - `"ok"` or `"error"`
/// * `latency_seconds` - Call latency
pub fn record_provider_fetch(provider: &str, status: &str, latency_seconds: f64) {
    counter!(
        "provider_fetch_total",
        "provider" => provider.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("provider_fetch_latency_seconds", "provider" => provider.to_string()).record(latency_seconds);
}

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Record a reconciliation outcome for one portfolio.
///
/// * `status` - `"within_tolerance"` or `"discrepancy"`
/// * `discrepancy_count` - Number of discrepancies found
pub fn record_reconciliation(status: &str, discrepancy_count: usize) {
    counter!("reconciliation_runs_total", "status" => status.to_string()).increment(1);
    #[allow(clippy::cast_precision_loss)]
    gauge!("reconciliation_discrepancies").set(discrepancy_count as f64);
}

// ============================================================================
// Capability / Pattern Runtime Metrics
// ============================================================================

/// Record a capability invocation.
///
/// * `capability` - Capability name
/// * `source` - Provenance tag (`"real"`, `"error"`, `"placeholder"`)
/// * `duration_seconds` - Invocation latency (including retries)
pub fn record_capability_invocation(capability: &str, source: &str, duration_seconds: f64) {
    counter!(
        "capability_invocations_total",
        "capability" => capability.to_string(),
        "source" => source.to_string()
    )
    .increment(1);

    histogram!("capability_invocation_seconds", "capability" => capability.to_string()).record(duration_seconds);
}

/// Record a pattern execution.
///
/// * `pattern_id` - Pattern id
/// * `status` - `"ok"` or `"failed"`
/// * `duration_seconds` - Total execution time across all steps
pub fn record_pattern_execution(pattern_id: &str, status: &str, duration_seconds: f64) {
    counter!(
        "pattern_executions_total",
        "pattern_id" => pattern_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("pattern_execution_seconds").record(duration_seconds);
}

// ============================================================================
// Alerting Metrics
// ============================================================================

/// Record an alert evaluation outcome.
///
/// * `status` - `"fired"`, `"not_fired"`, or `"cooldown"`
pub fn record_alert_evaluation(status: &str) {
    counter!("alert_evaluations_total", "status" => status.to_string()).increment(1);
}

/// Record a notification delivery attempt.
///
/// * `channel` - Channel kind (e.g. `"in_app"`, `"email"`)
/// * `status` - `"delivered"` or `"failed"`
pub fn record_notification_delivery(channel: &str, status: &str) {
    counter!(
        "notification_deliveries_total",
        "channel" => channel.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Update the dead-letter-queue depth gauge.
pub fn update_dlq_depth(depth: i64) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("alert_dlq_depth").set(depth as f64);
}

// ============================================================================
// Circuit Breaker Metrics
// ============================================================================

/// Circuit breaker state values for the gauge.
#[allow(dead_code)]
pub mod circuit_breaker_state {
    /// Circuit is closed (healthy).
    pub const CLOSED: f64 = 0.0;
    /// Circuit is open (failing).
    pub const OPEN: f64 = 1.0;
    /// Circuit is half-open (testing).
    pub const HALF_OPEN: f64 = 2.0;
}

/// Update circuit breaker state gauge.
///
/// * `service` - Breaker name (e.g. `"primary_price_provider"`, `"fx_provider"`)
/// * `state` - Numeric state (0=closed, 1=open, 2=`half_open`)
pub fn record_circuit_breaker_state(service: &str, state: f64) {
    gauge!("circuit_breaker_state", "service" => service.to_string()).set(state);
}

/// Record a circuit breaker failure.
pub fn record_circuit_breaker_failure(service: &str) {
    counter!("circuit_breaker_failures_total", "service" => service.to_string()).increment(1);
}

/// Record a circuit breaker success.
pub fn record_circuit_breaker_success(service: &str) {
    counter!("circuit_breaker_success_total", "service" => service.to_string()).increment(1);
}

/// Record a circuit breaker rejection (call rejected due to open circuit).
pub fn record_circuit_breaker_rejected(service: &str) {
    counter!("circuit_breaker_rejected_total", "service" => service.to_string()).increment(1);
}

// ============================================================================
// Tests
// ============================================================================
