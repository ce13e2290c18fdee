#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Provider Proxy - Market Data Multiplexer
//!
//! A gRPC proxy service that maintains single connections to the external
//! provider feeds (price, macro series, news sentiment) and multiplexes
//! updates to multiple downstream clients.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Core streaming logic and data types
//!   - `subscription`: Subscription tracking and management
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Interfaces for WebSocket clients, broadcast channels
//!   - `services`: Subscription management, health monitoring
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `provider`: WebSocket clients for the price/macro/news-sentiment feeds
//!   - `grpc`: gRPC streaming server implementation
//!   - `broadcast`: Channel-based message distribution
//!   - `config`: Configuration and dependency injection
//!   - `health`: Health check HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//! Price feed WS    --+
//!                     |     +-------------+     +-------------+
//!                     +---->|  Broadcast  |---->|    gRPC     |---> Client 1
//! Macro feed WS    ---+     |   Channels  |     |   Server    |---> Client 2
//!                     |     +-------------+     +-------------+---> Client N
//! News sentiment WS --+
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core streaming types with no external dependencies.
pub mod domain;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::subscription::{
    ConsumerId, SubscriptionChanges, SubscriptionManager, SubscriptionStats, SubscriptionType,
    Symbol, TotalSubscriptionStats,
};

// Infrastructure config
pub use infrastructure::config::{
    BroadcastSettings, ConfigError, Credentials, Environment, FeedUrls, ProxyConfig,
    ServerSettings, WebSocketSettings,
};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Broadcast hub (for integration tests)
pub use infrastructure::broadcast::{
    BroadcastConfig, BroadcastHub, BroadcastStats, SharedBroadcastHub,
};

// gRPC server (for integration tests)
pub use infrastructure::grpc::{
    proto::truth_spine::v1 as proto,
    server::{FeedState, StreamProxyServer, StreamProxyServerConfig},
};

// Provider wire message types (for integration tests)
pub use infrastructure::provider::messages::{
    MacroSeriesUpdateMessage, NewsSentimentUpdateMessage, PriceUpdateMessage,
};

// Metrics
pub use infrastructure::metrics::{
    FeedType as MetricsFeedType, MessageType as MetricsMessageType, init_metrics,
};

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
