//! Price Feed WebSocket Client
//!
//! Connects to the upstream pricing provider's WebSocket stream for
//! real-time security close/quote price updates.
//!
//! # Protocol
//!
//! Messages are JSON-encoded; a text frame may carry a single object or an
//! array of objects.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::auth::{AuthHandler, AuthState, Credentials};
use super::codec::{CodecError, JsonCodec};
use super::heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
use super::messages::{PriceUpdateMessage, ProviderMessage, SubscriptionRequest};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the price feed client.
#[derive(Debug, thiserror::Error)]
pub enum PriceFeedError {
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[from] super::auth::AuthError),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Maximum reconnection attempts exceeded.
    #[error("maximum reconnection attempts exceeded")]
    MaxReconnectAttemptsExceeded,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,
}

// =============================================================================
// Events
// =============================================================================

/// Events emitted by the price feed client.
#[derive(Debug, Clone)]
pub enum PriceFeedEvent {
    /// Successfully connected and authenticated.
    Connected,
    /// Disconnected from server.
    Disconnected,
    /// Reconnecting to server.
    Reconnecting {
        /// Reconnection attempt number.
        attempt: u32,
    },
    /// Received a price update.
    Price(PriceUpdateMessage),
    /// Subscription confirmation.
    Subscribed {
        /// Security identifiers now subscribed.
        security_ids: Vec<String>,
    },
    /// Error occurred.
    Error(String),
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the price feed client.
#[derive(Debug, Clone)]
pub struct PriceFeedConfig {
    /// WebSocket URL.
    pub url: String,
    /// API credentials.
    pub credentials: Credentials,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
    /// Heartbeat configuration.
    pub heartbeat: HeartbeatConfig,
}

impl PriceFeedConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(url: String, credentials: Credentials) -> Self {
        Self {
            url,
            credentials,
            reconnect: ReconnectConfig::default(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

// =============================================================================
// Subscription State
// =============================================================================

/// Tracks currently subscribed security identifiers.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionState {
    /// Subscribed security identifiers.
    pub security_ids: Vec<String>,
}

impl SubscriptionState {
    /// Check if there are any active subscriptions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.security_ids.is_empty()
    }

    /// Create a subscribe request to restore all subscriptions.
    #[must_use]
    pub fn to_subscribe_request(&self) -> Option<SubscriptionRequest> {
        if self.is_empty() {
            None
        } else {
            Some(SubscriptionRequest::subscribe().with_prices(self.security_ids.clone()))
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// WebSocket client for the price feed.
///
/// Manages the connection lifecycle including authentication, heartbeat
/// monitoring, automatic reconnection with exponential backoff, and
/// subscription management.
pub struct PriceFeedClient {
    config: PriceFeedConfig,
    codec: JsonCodec,
    event_tx: mpsc::Sender<PriceFeedEvent>,
    cancel: CancellationToken,
    subscriptions: parking_lot::RwLock<SubscriptionState>,
}

impl PriceFeedClient {
    /// Create a new price feed client.
    #[must_use]
    pub fn new(
        config: PriceFeedConfig,
        event_tx: mpsc::Sender<PriceFeedEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            codec: JsonCodec::new(),
            event_tx,
            cancel,
            subscriptions: parking_lot::RwLock::new(SubscriptionState::default()),
        }
    }

    /// Run the client connection loop.
    ///
    /// Connects to the WebSocket server, authenticates, and processes
    /// messages until cancelled or an unrecoverable error occurs.
    pub async fn run(self: Arc<Self>) -> Result<(), PriceFeedError> {
        let mut reconnect_policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("price feed client cancelled");
                return Ok(());
            }

            match self.connect_and_run().await {
                Ok(()) => {
                    tracing::info!("price feed connection closed gracefully");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "price feed connection error");

                    let _ = self.event_tx.send(PriceFeedEvent::Disconnected).await;

                    if let Some(delay) = reconnect_policy.next_delay() {
                        let attempt = reconnect_policy.attempt_count();
                        tracing::info!(
                            attempt,
                            delay_ms = delay.as_millis(),
                            "reconnecting to price feed"
                        );

                        let _ = self
                            .event_tx
                            .send(PriceFeedEvent::Reconnecting { attempt })
                            .await;

                        tokio::select! {
                            () = self.cancel.cancelled() => {
                                tracing::info!("price feed client cancelled during reconnect delay");
                                return Ok(());
                            }
                            () = tokio::time::sleep(delay) => {}
                        }
                    } else {
                        return Err(PriceFeedError::MaxReconnectAttemptsExceeded);
                    }
                }
            }
        }
    }

    async fn connect_and_run(&self) -> Result<(), PriceFeedError> {
        tracing::info!(url = %self.config.url, "connecting to price feed");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        let mut auth_handler = AuthHandler::new(self.config.credentials.clone());
        auth_handler.on_connected();
        let auth_req = auth_handler.create_auth_request();
        let auth_json = serde_json::to_string(&auth_req).map_err(|e| {
            PriceFeedError::ConnectionFailed(format!("failed to serialize auth: {e}"))
        })?;
        write
            .send(Message::Text(auth_json.into()))
            .await
            .map_err(|e| PriceFeedError::ConnectionFailed(format!("failed to send auth: {e}")))?;

        let heartbeat_state = Arc::new(HeartbeatState::new());
        let (heartbeat_tx, mut heartbeat_rx) = mpsc::channel::<HeartbeatEvent>(10);
        let heartbeat_cancel = CancellationToken::new();
        let heartbeat_manager = HeartbeatManager::new(
            self.config.heartbeat.clone(),
            heartbeat_state.clone(),
            heartbeat_tx,
            heartbeat_cancel.clone(),
        );
        let _heartbeat_handle = tokio::spawn(heartbeat_manager.run());

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    heartbeat_cancel.cancel();
                    return Ok(());
                }
                heartbeat_event = heartbeat_rx.recv() => {
                    match heartbeat_event {
                        Some(HeartbeatEvent::SendPing) => {
                            heartbeat_state.mark_ping_sent();
                            write.send(Message::Ping(vec![].into())).await?;
                        }
                        Some(HeartbeatEvent::Timeout) => {
                            tracing::warn!("heartbeat timeout");
                            heartbeat_cancel.cancel();
                            return Err(PriceFeedError::ConnectionClosed);
                        }
                        None => {
                            tracing::debug!("heartbeat channel closed");
                        }
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            heartbeat_state.record_pong();
                            self.handle_text_message(&text, &mut auth_handler, &mut write).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            heartbeat_state.record_pong();
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("server sent close frame");
                            heartbeat_cancel.cancel();
                            return Err(PriceFeedError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            heartbeat_cancel.cancel();
                            return Err(e.into());
                        }
                        None => {
                            tracing::info!("WebSocket stream ended");
                            heartbeat_cancel.cancel();
                            return Err(PriceFeedError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    async fn handle_text_message<W>(
        &self,
        text: &str,
        auth_handler: &mut AuthHandler,
        write: &mut W,
    ) -> Result<(), PriceFeedError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let messages = self.codec.decode(text)?;

        for msg in messages {
            match msg {
                ProviderMessage::Success(success) => {
                    let authenticated = auth_handler.on_success(&success)?;

                    if authenticated {
                        tracing::info!("price feed authenticated");
                        let _ = self.event_tx.send(PriceFeedEvent::Connected).await;

                        let subs = self.subscriptions.read().clone();
                        if let Some(request) = subs.to_subscribe_request() {
                            self.send_subscribe(write, &request).await?;
                        }
                    }
                }
                ProviderMessage::Error(error) => {
                    tracing::error!(code = error.code, msg = %error.msg, "price feed error");

                    if auth_handler.state() != AuthState::Authenticated {
                        return Err(auth_handler.on_error(&error).into());
                    }

                    let _ = self.event_tx.send(PriceFeedEvent::Error(error.msg)).await;
                }
                ProviderMessage::Subscription(sub) => {
                    tracing::debug!(security_ids = ?sub.prices, "subscription confirmed");
                    let _ = self
                        .event_tx
                        .send(PriceFeedEvent::Subscribed { security_ids: sub.prices })
                        .await;
                }
                ProviderMessage::Price(price) => {
                    let _ = self.event_tx.send(PriceFeedEvent::Price(price)).await;
                }
                _ => {
                    tracing::trace!("ignoring unhandled message type on price feed");
                }
            }
        }

        Ok(())
    }

    async fn send_subscribe<W>(
        &self,
        write: &mut W,
        request: &SubscriptionRequest,
    ) -> Result<(), PriceFeedError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let json = serde_json::to_string(request).map_err(|e| {
            PriceFeedError::ConnectionFailed(format!("failed to serialize subscribe: {e}"))
        })?;

        tracing::debug!(security_ids = ?request.prices, "sending subscribe request");

        write
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| PriceFeedError::ConnectionFailed(format!("failed to send subscribe: {e}")))?;

        Ok(())
    }

    /// Subscribe to additional security identifiers.
    pub fn subscribe(&self, security_ids: Vec<String>) {
        let mut subs = self.subscriptions.write();
        for id in security_ids {
            if !subs.security_ids.contains(&id) {
                subs.security_ids.push(id);
            }
        }
    }

    /// Unsubscribe from security identifiers.
    pub fn unsubscribe(&self, security_ids: &[String]) {
        let mut subs = self.subscriptions.write();
        subs.security_ids.retain(|s| !security_ids.contains(s));
    }

    /// Get current subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> SubscriptionState {
        self.subscriptions.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_state_empty() {
        let state = SubscriptionState::default();
        assert!(state.is_empty());
    }

    #[test]
    fn subscription_state_with_ids() {
        let state = SubscriptionState { security_ids: vec!["AAPL".to_string()] };
        assert!(!state.is_empty());
    }

    #[test]
    fn subscription_state_to_request() {
        let state = SubscriptionState {
            security_ids: vec!["AAPL".to_string(), "MSFT".to_string()],
        };
        let request = state.to_subscribe_request().unwrap();
        assert_eq!(request.prices, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn subscription_state_empty_returns_none() {
        let state = SubscriptionState::default();
        assert!(state.to_subscribe_request().is_none());
    }

    #[test]
    fn price_feed_config_new() {
        let creds = Credentials::new("key", "secret").unwrap();
        let config = PriceFeedConfig::new("wss://example.test/v1/prices".to_string(), creds);
        assert_eq!(config.url, "wss://example.test/v1/prices");
    }
}
