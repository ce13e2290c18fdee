//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Messages**: Counts of messages received and sent by type
//! - **Connections**: WebSocket and gRPC connection states
//! - **Subscriptions**: Active subscription counts
//! - **Latency**: Message processing and delivery latencies
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if called more than once or if the recorder cannot be installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Message counters
    describe_counter!(
        "provider_proxy_messages_received_total",
        "Total messages received from provider feeds"
    );
    describe_counter!(
        "provider_proxy_messages_sent_total",
        "Total messages sent to gRPC clients"
    );
    describe_counter!(
        "provider_proxy_messages_dropped_total",
        "Total messages dropped due to slow consumers"
    );

    // Connection gauges
    describe_gauge!(
        "provider_proxy_websocket_connections",
        "Number of active WebSocket connections to providers"
    );
    describe_gauge!(
        "provider_proxy_grpc_clients",
        "Number of active gRPC client connections"
    );

    // Subscription gauges
    describe_gauge!(
        "provider_proxy_subscriptions_total",
        "Total number of active subscriptions"
    );

    // Error counters
    describe_counter!(
        "provider_proxy_websocket_errors_total",
        "Total WebSocket errors by type"
    );
    describe_counter!(
        "provider_proxy_reconnects_total",
        "Total WebSocket reconnection attempts"
    );

    // Latency histograms
    describe_histogram!(
        "provider_proxy_message_processing_seconds",
        "Time to process messages from WebSocket to broadcast"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for feed types.
#[derive(Debug, Clone, Copy)]
pub enum FeedType {
    /// Price feed.
    Price,
    /// Macro series feed.
    Macro,
    /// News sentiment feed.
    NewsSentiment,
}

impl FeedType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Macro => "macro",
            Self::NewsSentiment => "news_sentiment",
        }
    }
}

/// Metric labels for message types.
#[derive(Debug, Clone, Copy)]
pub enum MessageType {
    /// Price update.
    Price,
    /// Macro series observation.
    MacroSeries,
    /// News sentiment update.
    NewsSentiment,
}

impl MessageType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::MacroSeries => "macro_series",
            Self::NewsSentiment => "news_sentiment",
        }
    }
}

/// Record a message received from a provider feed.
pub fn record_message_received(feed: FeedType, msg_type: MessageType) {
    counter!(
        "provider_proxy_messages_received_total",
        "feed" => feed.as_str(),
        "message_type" => msg_type.as_str()
    )
    .increment(1);
}

/// Record a message sent to gRPC clients.
pub fn record_message_sent(msg_type: MessageType, count: u64) {
    counter!(
        "provider_proxy_messages_sent_total",
        "message_type" => msg_type.as_str()
    )
    .increment(count);
}

/// Record messages dropped due to slow consumers.
pub fn record_messages_dropped(msg_type: MessageType, count: u64) {
    counter!(
        "provider_proxy_messages_dropped_total",
        "message_type" => msg_type.as_str()
    )
    .increment(count);
}

/// Update the WebSocket connection count for a feed.
pub fn set_websocket_connections(feed: FeedType, count: f64) {
    gauge!(
        "provider_proxy_websocket_connections",
        "feed" => feed.as_str()
    )
    .set(count);
}

/// Update the gRPC client count.
pub fn set_grpc_clients(count: f64) {
    gauge!("provider_proxy_grpc_clients").set(count);
}

/// Update the total subscription count.
pub fn set_subscriptions(feed: FeedType, count: f64) {
    gauge!(
        "provider_proxy_subscriptions_total",
        "feed" => feed.as_str()
    )
    .set(count);
}

/// Record a WebSocket error.
pub fn record_websocket_error(feed: FeedType, error_type: &str) {
    counter!(
        "provider_proxy_websocket_errors_total",
        "feed" => feed.as_str(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

/// Record a WebSocket reconnection attempt.
pub fn record_reconnect(feed: FeedType) {
    counter!(
        "provider_proxy_reconnects_total",
        "feed" => feed.as_str()
    )
    .increment(1);
}

/// Record message processing duration.
pub fn record_processing_duration(feed: FeedType, duration: Duration) {
    histogram!(
        "provider_proxy_message_processing_seconds",
        "feed" => feed.as_str()
    )
    .record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_type_as_str() {
        assert_eq!(FeedType::Price.as_str(), "price");
        assert_eq!(FeedType::Macro.as_str(), "macro");
        assert_eq!(FeedType::NewsSentiment.as_str(), "news_sentiment");
    }

    #[test]
    fn message_type_as_str() {
        assert_eq!(MessageType::Price.as_str(), "price");
        assert_eq!(MessageType::MacroSeries.as_str(), "macro_series");
        assert_eq!(MessageType::NewsSentiment.as_str(), "news_sentiment");
    }
}
