//! gRPC Streaming Server Implementation
//!
//! Implements the `ProviderProxyService` gRPC service that exposes the
//! price, macro series, and news sentiment feeds to downstream clients.

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

use super::proto::truth_spine::v1::{
    ConnectionState, ConnectionStatus, Environment, FeedStatus, FeedType,
    GetConnectionStatusRequest, GetConnectionStatusResponse, MacroSeriesUpdate,
    NewsSentimentUpdate, PriceUpdate, StreamMacroSeriesRequest, StreamMacroSeriesResponse,
    StreamNewsSentimentRequest, StreamNewsSentimentResponse, StreamPricesRequest,
    StreamPricesResponse, provider_proxy_service_server::ProviderProxyService,
};
use crate::SubscriptionManager;
use crate::domain::subscription::SubscriptionType;
use crate::infrastructure::broadcast::SharedBroadcastHub;
use crate::infrastructure::provider::messages::{
    MacroSeriesUpdateMessage, NewsSentimentUpdateMessage, PriceUpdateMessage,
};
use crate::infrastructure::provider::{MacroFeedClient, NewsSentimentFeedClient, PriceFeedClient};

// =============================================================================
// Type Aliases
// =============================================================================

type StreamResult<T> = Result<Response<T>, Status>;
type BoxedStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the gRPC streaming server.
#[derive(Debug, Clone)]
pub struct StreamProxyServerConfig {
    /// Proxy version string.
    pub version: String,
    /// Environment (PAPER or LIVE).
    pub environment: Environment,
}

impl Default for StreamProxyServerConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Paper,
        }
    }
}

// =============================================================================
// Feed State Tracking
// =============================================================================

/// Tracks the state of an upstream feed connection.
#[derive(Debug)]
pub struct FeedState {
    feed_type: FeedType,
    state: parking_lot::RwLock<ConnectionState>,
    last_connected_at: parking_lot::RwLock<Option<DateTime<Utc>>>,
    error_message: parking_lot::RwLock<Option<String>>,
    subscription_count: AtomicI32,
    reconnect_attempts: AtomicI32,
    messages_received: AtomicU64,
}

impl FeedState {
    const fn new(feed_type: FeedType) -> Self {
        Self {
            feed_type,
            state: parking_lot::RwLock::new(ConnectionState::Disconnected),
            last_connected_at: parking_lot::RwLock::new(None),
            error_message: parking_lot::RwLock::new(None),
            subscription_count: AtomicI32::new(0),
            reconnect_attempts: AtomicI32::new(0),
            messages_received: AtomicU64::new(0),
        }
    }

    /// Set the connection state.
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
        if state == ConnectionState::Connected {
            *self.last_connected_at.write() = Some(Utc::now());
            self.reconnect_attempts.store(0, Ordering::Relaxed);
            *self.error_message.write() = None;
        }
    }

    /// Set an error state with message.
    pub fn set_error(&self, message: String) {
        *self.state.write() = ConnectionState::Error;
        *self.error_message.write() = Some(message);
    }

    /// Increment reconnect attempts.
    pub fn increment_reconnect_attempts(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment messages received counter.
    pub fn increment_messages(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Update subscription count.
    pub fn set_subscription_count(&self, count: i32) {
        self.subscription_count.store(count, Ordering::Relaxed);
    }

    /// Get the current connection state.
    #[must_use]
    pub fn get_state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Get messages received count.
    #[must_use]
    pub fn get_messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Get reconnect attempts count.
    #[must_use]
    pub fn get_reconnect_attempts(&self) -> i32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    fn to_proto(&self) -> FeedStatus {
        FeedStatus {
            feed_type: self.feed_type.into(),
            state: (*self.state.read()).into(),
            last_connected_at: self.last_connected_at.read().map(datetime_to_timestamp),
            error_message: self.error_message.read().clone(),
            subscription_count: self.subscription_count.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            messages_received: i64::try_from(self.messages_received.load(Ordering::Relaxed))
                .unwrap_or(i64::MAX),
        }
    }
}

// =============================================================================
// Server Implementation
// =============================================================================

/// gRPC streaming server multiplexing the three provider feeds.
pub struct StreamProxyServer {
    config: StreamProxyServerConfig,
    broadcast_hub: SharedBroadcastHub,
    subscription_manager: Arc<SubscriptionManager>,
    price_client: Arc<PriceFeedClient>,
    macro_client: Arc<MacroFeedClient>,
    news_sentiment_client: Arc<NewsSentimentFeedClient>,
    started_at: Instant,
    client_count: Arc<AtomicI32>,
    price_state: Arc<FeedState>,
    macro_state: Arc<FeedState>,
    news_sentiment_state: Arc<FeedState>,
}

impl StreamProxyServer {
    /// Create a new gRPC streaming server.
    #[must_use]
    pub fn new(
        config: StreamProxyServerConfig,
        broadcast_hub: SharedBroadcastHub,
        subscription_manager: Arc<SubscriptionManager>,
        price_client: Arc<PriceFeedClient>,
        macro_client: Arc<MacroFeedClient>,
        news_sentiment_client: Arc<NewsSentimentFeedClient>,
    ) -> Self {
        Self {
            config,
            broadcast_hub,
            subscription_manager,
            price_client,
            macro_client,
            news_sentiment_client,
            started_at: Instant::now(),
            client_count: Arc::new(AtomicI32::new(0)),
            price_state: Arc::new(FeedState::new(FeedType::Price)),
            macro_state: Arc::new(FeedState::new(FeedType::Macro)),
            news_sentiment_state: Arc::new(FeedState::new(FeedType::NewsSentiment)),
        }
    }

    /// Get the price feed state for external updates.
    #[must_use]
    pub fn price_state(&self) -> Arc<FeedState> {
        Arc::clone(&self.price_state)
    }

    /// Get the macro series feed state for external updates.
    #[must_use]
    pub fn macro_state(&self) -> Arc<FeedState> {
        Arc::clone(&self.macro_state)
    }

    /// Get the news sentiment feed state for external updates.
    #[must_use]
    pub fn news_sentiment_state(&self) -> Arc<FeedState> {
        Arc::clone(&self.news_sentiment_state)
    }

    fn increment_client_count(&self) {
        self.client_count.fetch_add(1, Ordering::Relaxed);
    }
}

#[tonic::async_trait]
impl ProviderProxyService for StreamProxyServer {
    type StreamPricesStream = BoxedStream<StreamPricesResponse>;
    type StreamMacroSeriesStream = BoxedStream<StreamMacroSeriesResponse>;
    type StreamNewsSentimentStream = BoxedStream<StreamNewsSentimentResponse>;

    async fn stream_prices(
        &self,
        request: Request<StreamPricesRequest>,
    ) -> StreamResult<Self::StreamPricesStream> {
        let req = request.into_inner();
        let security_ids: HashSet<String> = req.security_ids.into_iter().collect();
        let filter_all = security_ids.is_empty();

        let consumer_id = uuid::Uuid::new_v4().as_u64_pair().0;
        self.increment_client_count();

        if !filter_all {
            let ids: Vec<String> = security_ids.iter().cloned().collect();
            let changes =
                self.subscription_manager
                    .add_subscriptions(consumer_id, SubscriptionType::Price, &ids);
            if !changes.subscribe.is_empty() {
                self.price_client
                    .subscribe(changes.subscribe.into_iter().collect());
            }
        }

        let mut rx = self.broadcast_hub.prices_rx();
        let (tx, grpc_rx) = tokio::sync::mpsc::channel(1024);
        let client_count = Arc::clone(&self.client_count);
        let price_state = Arc::clone(&self.price_state);
        let subscription_manager = Arc::clone(&self.subscription_manager);
        let price_client = Arc::clone(&self.price_client);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(broadcast) => {
                        if filter_all || security_ids.contains(&broadcast.price.security_id) {
                            price_state.increment_messages();
                            let response = StreamPricesResponse {
                                price: Some(price_to_proto(&broadcast.price)),
                            };
                            if tx.send(Ok(response)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(consumer_id = %consumer_id, lagged = n, "price receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }

            client_count.fetch_sub(1, Ordering::Relaxed);
            let removed = subscription_manager.remove_subscriptions(
                consumer_id,
                SubscriptionType::Price,
                &security_ids.into_iter().collect::<Vec<_>>(),
            );
            if !removed.unsubscribe.is_empty() {
                let ids: Vec<String> = removed.unsubscribe.into_iter().collect();
                price_client.unsubscribe(&ids);
            }
        });

        let stream = ReceiverStream::new(grpc_rx);
        Ok(Response::new(Box::pin(stream) as Self::StreamPricesStream))
    }

    async fn stream_macro_series(
        &self,
        request: Request<StreamMacroSeriesRequest>,
    ) -> StreamResult<Self::StreamMacroSeriesStream> {
        let req = request.into_inner();
        let series_names: HashSet<String> = req.series_names.into_iter().collect();
        let filter_all = series_names.is_empty();

        let consumer_id = uuid::Uuid::new_v4().as_u64_pair().0;
        self.increment_client_count();

        if !filter_all {
            let names: Vec<String> = series_names.iter().cloned().collect();
            let changes =
                self.subscription_manager
                    .add_subscriptions(consumer_id, SubscriptionType::Macro, &names);
            if !changes.subscribe.is_empty() {
                self.macro_client
                    .subscribe(changes.subscribe.into_iter().collect());
            }
        }

        let mut rx = self.broadcast_hub.macro_series_rx();
        let (tx, grpc_rx) = tokio::sync::mpsc::channel(1024);
        let client_count = Arc::clone(&self.client_count);
        let macro_state = Arc::clone(&self.macro_state);
        let subscription_manager = Arc::clone(&self.subscription_manager);
        let macro_client = Arc::clone(&self.macro_client);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(broadcast) => {
                        if filter_all || series_names.contains(&broadcast.series.series_name) {
                            macro_state.increment_messages();
                            let response = StreamMacroSeriesResponse {
                                series: Some(macro_series_to_proto(&broadcast.series)),
                            };
                            if tx.send(Ok(response)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(consumer_id = %consumer_id, lagged = n, "macro series receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }

            client_count.fetch_sub(1, Ordering::Relaxed);
            let removed = subscription_manager.remove_subscriptions(
                consumer_id,
                SubscriptionType::Macro,
                &series_names.into_iter().collect::<Vec<_>>(),
            );
            if !removed.unsubscribe.is_empty() {
                let names: Vec<String> = removed.unsubscribe.into_iter().collect();
                macro_client.unsubscribe(&names);
            }
        });

        let stream = ReceiverStream::new(grpc_rx);
        Ok(Response::new(
            Box::pin(stream) as Self::StreamMacroSeriesStream
        ))
    }

    async fn stream_news_sentiment(
        &self,
        request: Request<StreamNewsSentimentRequest>,
    ) -> StreamResult<Self::StreamNewsSentimentStream> {
        let req = request.into_inner();
        let security_ids: HashSet<String> = req.security_ids.into_iter().collect();
        let filter_all = security_ids.is_empty();

        let consumer_id = uuid::Uuid::new_v4().as_u64_pair().0;
        self.increment_client_count();

        if !filter_all {
            let ids: Vec<String> = security_ids.iter().cloned().collect();
            let changes = self.subscription_manager.add_subscriptions(
                consumer_id,
                SubscriptionType::NewsSentiment,
                &ids,
            );
            if !changes.subscribe.is_empty() {
                self.news_sentiment_client
                    .subscribe(changes.subscribe.into_iter().collect());
            }
        }

        let mut rx = self.broadcast_hub.news_sentiment_rx();
        let (tx, grpc_rx) = tokio::sync::mpsc::channel(1024);
        let client_count = Arc::clone(&self.client_count);
        let news_sentiment_state = Arc::clone(&self.news_sentiment_state);
        let subscription_manager = Arc::clone(&self.subscription_manager);
        let news_sentiment_client = Arc::clone(&self.news_sentiment_client);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(broadcast) => {
                        if filter_all || security_ids.contains(&broadcast.sentiment.security_id) {
                            news_sentiment_state.increment_messages();
                            let response = StreamNewsSentimentResponse {
                                sentiment: Some(news_sentiment_to_proto(&broadcast.sentiment)),
                            };
                            if tx.send(Ok(response)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(consumer_id = %consumer_id, lagged = n, "news sentiment receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }

            client_count.fetch_sub(1, Ordering::Relaxed);
            let removed = subscription_manager.remove_subscriptions(
                consumer_id,
                SubscriptionType::NewsSentiment,
                &security_ids.into_iter().collect::<Vec<_>>(),
            );
            if !removed.unsubscribe.is_empty() {
                let ids: Vec<String> = removed.unsubscribe.into_iter().collect();
                news_sentiment_client.unsubscribe(&ids);
            }
        });

        let stream = ReceiverStream::new(grpc_rx);
        Ok(Response::new(
            Box::pin(stream) as Self::StreamNewsSentimentStream
        ))
    }

    async fn get_connection_status(
        &self,
        _request: Request<GetConnectionStatusRequest>,
    ) -> StreamResult<GetConnectionStatusResponse> {
        let now = Utc::now();
        let started_at =
            now - chrono::Duration::from_std(self.started_at.elapsed()).unwrap_or_default();

        let status = ConnectionStatus {
            version: self.config.version.clone(),
            started_at: Some(datetime_to_timestamp(started_at)),
            current_time: Some(datetime_to_timestamp(now)),
            feeds: vec![
                self.price_state.to_proto(),
                self.macro_state.to_proto(),
                self.news_sentiment_state.to_proto(),
            ],
            client_count: self.client_count.load(Ordering::Relaxed),
            environment: self.config.environment.into(),
        };

        Ok(Response::new(GetConnectionStatusResponse {
            status: Some(status),
        }))
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn datetime_to_timestamp(dt: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: dt.timestamp(),
        nanos: i32::try_from(dt.timestamp_subsec_nanos()).unwrap_or(i32::MAX),
    }
}

fn decimal_to_f64(d: Decimal) -> f64 {
    use std::str::FromStr;
    f64::from_str(&d.to_string()).unwrap_or(0.0)
}

fn price_to_proto(msg: &PriceUpdateMessage) -> PriceUpdate {
    PriceUpdate {
        security_id: msg.security_id.clone(),
        timestamp: Some(datetime_to_timestamp(msg.timestamp)),
        close: decimal_to_f64(msg.close),
        currency: msg.currency.clone(),
        source: msg.source.clone(),
    }
}

fn macro_series_to_proto(msg: &MacroSeriesUpdateMessage) -> MacroSeriesUpdate {
    MacroSeriesUpdate {
        series_name: msg.series_name.clone(),
        timestamp: Some(datetime_to_timestamp(msg.timestamp)),
        value: decimal_to_f64(msg.value),
        source: msg.source.clone(),
    }
}

fn news_sentiment_to_proto(msg: &NewsSentimentUpdateMessage) -> NewsSentimentUpdate {
    NewsSentimentUpdate {
        security_id: msg.security_id.clone(),
        timestamp: Some(datetime_to_timestamp(msg.timestamp)),
        score: decimal_to_f64(msg.score),
        source: msg.source.clone(),
        headline: msg.headline.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_state_transitions() {
        let state = FeedState::new(FeedType::Price);
        assert_eq!(state.get_state(), ConnectionState::Disconnected);

        state.set_state(ConnectionState::Connected);
        assert_eq!(state.get_state(), ConnectionState::Connected);
        assert_eq!(state.get_reconnect_attempts(), 0);

        state.set_error("connection reset".to_string());
        assert_eq!(state.get_state(), ConnectionState::Error);
    }

    #[test]
    fn feed_state_counters() {
        let state = FeedState::new(FeedType::Macro);

        state.increment_messages();
        state.increment_messages();
        assert_eq!(state.get_messages_received(), 2);

        state.increment_reconnect_attempts();
        assert_eq!(state.get_reconnect_attempts(), 1);

        state.set_state(ConnectionState::Connected);
        assert_eq!(state.get_reconnect_attempts(), 0);
    }

    #[test]
    fn datetime_conversion() {
        let dt = Utc::now();
        let ts = datetime_to_timestamp(dt);
        assert_eq!(ts.seconds, dt.timestamp());
    }

    #[test]
    fn decimal_conversion() {
        use rust_decimal_macros::dec;
        assert!((decimal_to_f64(dec!(190.25)) - 190.25).abs() < f64::EPSILON);
        assert!((decimal_to_f64(dec!(-0.4)) - (-0.4)).abs() < f64::EPSILON);
    }
}
