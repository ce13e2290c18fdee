//! Observability module for metrics, tracing, and logging.
//!
//! Instrumentation for the nightly pipeline and capability runtime: Prometheus
//! metrics export and OpenTelemetry distributed tracing.

mod metrics;

pub use metrics::{
    circuit_breaker_state, init_metrics, record_alert_evaluation, record_capability_invocation,
    record_circuit_breaker_failure, record_circuit_breaker_rejected, record_circuit_breaker_state,
    record_circuit_breaker_success, record_notification_delivery, record_pack_build,
    record_pattern_execution, record_provider_fetch, record_reconciliation, record_step,
    update_dlq_depth, MetricsConfig,
};
