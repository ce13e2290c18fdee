//! Provider Proxy Binary
//!
//! Starts the provider feed proxy.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin provider-proxy
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `PROVIDER_KEY`: Provider API key
//! - `PROVIDER_SECRET`: Provider API secret
//!
//! ## Optional
//! - `TRUTH_SPINE_ENV`: PAPER | LIVE (default: PAPER)
//! - `PRICE_FEED_URL`, `MACRO_FEED_URL`, `NEWS_SENTIMENT_FEED_URL`: Feed WebSocket URLs
//! - `PROVIDER_PROXY_GRPC_PORT`: gRPC server port (default: 50052)
//! - `PROVIDER_PROXY_HEALTH_PORT`: Health check HTTP port (default: 8082)
//! - `PROVIDER_PROXY_METRICS_PORT`: Prometheus metrics port (default: 9090)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4318>)
//! - `OTEL_SERVICE_NAME`: Service name (default: truth-spine-provider-proxy)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use provider_proxy::infrastructure::broadcast::{BroadcastConfig, BroadcastHub};
use provider_proxy::infrastructure::grpc::proto::truth_spine::v1::ConnectionState;
use provider_proxy::infrastructure::grpc::proto::truth_spine::v1::provider_proxy_service_server::ProviderProxyServiceServer;
use provider_proxy::infrastructure::grpc::server::{StreamProxyServer, StreamProxyServerConfig};
use provider_proxy::infrastructure::health::{HealthServer, HealthServerState};
use provider_proxy::infrastructure::provider::{
    Credentials, MacroFeedClient, MacroFeedConfig, MacroFeedEvent, NewsSentimentFeedClient,
    NewsSentimentFeedConfig, NewsSentimentFeedEvent, PriceFeedClient, PriceFeedConfig,
    PriceFeedEvent,
};
use provider_proxy::infrastructure::telemetry;
use provider_proxy::{Environment, ProxyConfig, SubscriptionManager, init_metrics};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting provider proxy");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = ProxyConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Initialize broadcast hub for message distribution
    let broadcast_config = BroadcastConfig::from(config.broadcast.clone());
    let broadcast_hub = Arc::new(BroadcastHub::new(broadcast_config));

    // Initialize subscription manager
    let subscription_manager = Arc::new(SubscriptionManager::new());

    // Create credentials for WebSocket clients
    let credentials = Credentials::new(config.credentials.api_key(), config.credentials.api_secret())?;

    // Create WebSocket client configurations
    let price_config = PriceFeedConfig::new(config.feed_urls.price.clone(), credentials.clone());
    let macro_config = MacroFeedConfig::new(config.feed_urls.r#macro.clone(), credentials.clone());
    let news_sentiment_config = NewsSentimentFeedConfig::new(
        config.feed_urls.news_sentiment.clone(),
        credentials.clone(),
    );

    // Create event channels for WebSocket clients
    let (price_tx, price_rx) = mpsc::channel::<PriceFeedEvent>(4096);
    let (macro_tx, macro_rx) = mpsc::channel::<MacroFeedEvent>(256);
    let (news_sentiment_tx, news_sentiment_rx) = mpsc::channel::<NewsSentimentFeedEvent>(1024);

    // Create WebSocket clients
    let price_client = Arc::new(PriceFeedClient::new(
        price_config,
        price_tx,
        shutdown_token.clone(),
    ));
    let macro_client = Arc::new(MacroFeedClient::new(
        macro_config,
        macro_tx,
        shutdown_token.clone(),
    ));
    let news_sentiment_client = Arc::new(NewsSentimentFeedClient::new(
        news_sentiment_config,
        news_sentiment_tx,
        shutdown_token.clone(),
    ));

    // Initialize gRPC server
    let grpc_environment = match config.environment {
        Environment::Paper => {
            provider_proxy::infrastructure::grpc::proto::truth_spine::v1::Environment::Paper
        }
        Environment::Live => {
            provider_proxy::infrastructure::grpc::proto::truth_spine::v1::Environment::Live
        }
    };
    let grpc_server_config = StreamProxyServerConfig {
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: grpc_environment,
    };
    let grpc_server = Arc::new(StreamProxyServer::new(
        grpc_server_config,
        Arc::clone(&broadcast_hub),
        Arc::clone(&subscription_manager),
        Arc::clone(&price_client),
        Arc::clone(&macro_client),
        Arc::clone(&news_sentiment_client),
    ));

    // Initialize health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&grpc_server),
        Arc::clone(&broadcast_hub),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        Arc::clone(&health_state),
        shutdown_token.clone(),
    );

    // Get feed states for tracking connection status
    let price_state = grpc_server.price_state();
    let macro_state = grpc_server.macro_state();
    let news_sentiment_state = grpc_server.news_sentiment_state();

    // Spawn price event handler
    let price_broadcast_hub = Arc::clone(&broadcast_hub);
    tokio::spawn(async move {
        handle_price_events(price_rx, price_broadcast_hub, price_state).await;
    });

    // Spawn macro series event handler
    let macro_broadcast_hub = Arc::clone(&broadcast_hub);
    tokio::spawn(async move {
        handle_macro_events(macro_rx, macro_broadcast_hub, macro_state).await;
    });

    // Spawn news sentiment event handler
    let news_sentiment_broadcast_hub = Arc::clone(&broadcast_hub);
    tokio::spawn(async move {
        handle_news_sentiment_events(
            news_sentiment_rx,
            news_sentiment_broadcast_hub,
            news_sentiment_state,
        )
        .await;
    });

    // Spawn WebSocket clients
    let price_client_clone = Arc::clone(&price_client);
    tokio::spawn(async move {
        if let Err(e) = price_client_clone.run().await {
            tracing::error!(error = %e, "price feed client error");
        }
    });

    let macro_client_clone = Arc::clone(&macro_client);
    tokio::spawn(async move {
        if let Err(e) = macro_client_clone.run().await {
            tracing::error!(error = %e, "macro series feed client error");
        }
    });

    let news_sentiment_client_clone = Arc::clone(&news_sentiment_client);
    tokio::spawn(async move {
        if let Err(e) = news_sentiment_client_clone.run().await {
            tracing::error!(error = %e, "news sentiment feed client error");
        }
    });

    // Spawn health server
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    // Spawn gRPC server
    let grpc_addr: SocketAddr = format!("0.0.0.0:{}", config.server.grpc_port).parse()?;
    let grpc_service = ProviderProxyServiceServer::from_arc(grpc_server);
    let grpc_shutdown = shutdown_token.clone();

    tokio::spawn(async move {
        tracing::info!(addr = %grpc_addr, "gRPC server listening");
        if let Err(e) = Server::builder()
            .add_service(grpc_service)
            .serve_with_shutdown(grpc_addr, grpc_shutdown.cancelled())
            .await
        {
            tracing::error!(error = %e, "gRPC server error");
        }
        tracing::info!("gRPC server stopped");
    });

    tracing::info!("Provider proxy ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("Provider proxy stopped");
    Ok(())
}

/// Handle events from the price feed WebSocket client.
async fn handle_price_events(
    mut rx: mpsc::Receiver<PriceFeedEvent>,
    broadcast_hub: Arc<BroadcastHub>,
    feed_state: Arc<provider_proxy::infrastructure::grpc::server::FeedState>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            PriceFeedEvent::Connected => {
                feed_state.set_state(ConnectionState::Connected);
                tracing::info!("price feed connected");
            }
            PriceFeedEvent::Disconnected => {
                feed_state.set_state(ConnectionState::Disconnected);
                tracing::warn!("price feed disconnected");
            }
            PriceFeedEvent::Reconnecting { attempt } => {
                feed_state.set_state(ConnectionState::Reconnecting);
                feed_state.increment_reconnect_attempts();
                tracing::info!(attempt, "price feed reconnecting");
            }
            PriceFeedEvent::Price(price) => {
                feed_state.increment_messages();
                let _ = broadcast_hub.send_price(price);
            }
            PriceFeedEvent::Subscribed { security_ids } => {
                feed_state.set_subscription_count(i32::try_from(security_ids.len()).unwrap_or(i32::MAX));
                tracing::debug!(count = security_ids.len(), "price subscriptions updated");
            }
            PriceFeedEvent::Error(msg) => {
                feed_state.set_error(msg.clone());
                tracing::error!(error = %msg, "price feed error");
            }
        }
    }
}

/// Handle events from the macro series feed WebSocket client.
async fn handle_macro_events(
    mut rx: mpsc::Receiver<MacroFeedEvent>,
    broadcast_hub: Arc<BroadcastHub>,
    feed_state: Arc<provider_proxy::infrastructure::grpc::server::FeedState>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            MacroFeedEvent::Connected => {
                feed_state.set_state(ConnectionState::Connected);
                tracing::info!("macro series feed connected");
            }
            MacroFeedEvent::Disconnected => {
                feed_state.set_state(ConnectionState::Disconnected);
                tracing::warn!("macro series feed disconnected");
            }
            MacroFeedEvent::Reconnecting { attempt } => {
                feed_state.set_state(ConnectionState::Reconnecting);
                feed_state.increment_reconnect_attempts();
                tracing::info!(attempt, "macro series feed reconnecting");
            }
            MacroFeedEvent::Series(series) => {
                feed_state.increment_messages();
                let _ = broadcast_hub.send_macro_series(series);
            }
            MacroFeedEvent::Subscribed { series_names } => {
                feed_state.set_subscription_count(i32::try_from(series_names.len()).unwrap_or(i32::MAX));
                tracing::debug!(count = series_names.len(), "macro series subscriptions updated");
            }
            MacroFeedEvent::Error(msg) => {
                feed_state.set_error(msg.clone());
                tracing::error!(error = %msg, "macro series feed error");
            }
        }
    }
}

/// Handle events from the news sentiment feed WebSocket client.
async fn handle_news_sentiment_events(
    mut rx: mpsc::Receiver<NewsSentimentFeedEvent>,
    broadcast_hub: Arc<BroadcastHub>,
    feed_state: Arc<provider_proxy::infrastructure::grpc::server::FeedState>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            NewsSentimentFeedEvent::Connected => {
                feed_state.set_state(ConnectionState::Connected);
                tracing::info!("news sentiment feed connected");
            }
            NewsSentimentFeedEvent::Disconnected => {
                feed_state.set_state(ConnectionState::Disconnected);
                tracing::warn!("news sentiment feed disconnected");
            }
            NewsSentimentFeedEvent::Reconnecting { attempt } => {
                feed_state.set_state(ConnectionState::Reconnecting);
                feed_state.increment_reconnect_attempts();
                tracing::info!(attempt, "news sentiment feed reconnecting");
            }
            NewsSentimentFeedEvent::Sentiment(sentiment) => {
                feed_state.increment_messages();
                let _ = broadcast_hub.send_news_sentiment(sentiment);
            }
            NewsSentimentFeedEvent::Subscribed { security_ids } => {
                feed_state.set_subscription_count(i32::try_from(security_ids.len()).unwrap_or(i32::MAX));
                tracing::debug!(count = security_ids.len(), "news sentiment subscriptions updated");
            }
            NewsSentimentFeedEvent::Error(msg) => {
                feed_state.set_error(msg.clone());
                tracing::error!(error = %msg, "news sentiment feed error");
            }
        }
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &ProxyConfig) {
    tracing::info!(
        environment = config.environment.as_str(),
        grpc_port = config.server.grpc_port,
        health_port = config.server.health_port,
        metrics_port = config.server.metrics_port,
        "Configuration loaded"
    );
    tracing::debug!(
        price_feed_url = %config.feed_urls.price,
        macro_feed_url = %config.feed_urls.r#macro,
        news_sentiment_feed_url = %config.feed_urls.news_sentiment,
        "WebSocket endpoints"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
