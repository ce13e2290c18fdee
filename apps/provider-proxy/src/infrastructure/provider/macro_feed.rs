//! Macro Series Feed WebSocket Client
//!
//! Connects to the upstream macro-indicator provider's WebSocket stream for
//! real-time observations of named macro series (e.g. `CPI_YOY`, `UNRATE`).

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::auth::{AuthHandler, AuthState, Credentials};
use super::codec::{CodecError, JsonCodec};
use super::heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
use super::messages::{MacroSeriesUpdateMessage, ProviderMessage, SubscriptionRequest};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the macro series feed client.
#[derive(Debug, thiserror::Error)]
pub enum MacroFeedError {
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

/// Events emitted by the macro series feed client.
#[derive(Debug, Clone)]
pub enum MacroFeedEvent {
    /// Successfully connected and authenticated.
    Connected,
    /// Disconnected from server.
    Disconnected,
    /// Reconnecting to server.
    Reconnecting {
        /// Reconnection attempt number.
        attempt: u32,
    },
    /// Received a macro series observation.
    Series(MacroSeriesUpdateMessage),
    /// Subscription confirmation.
    Subscribed {
        /// Series names now subscribed.
        series_names: Vec<String>,
    },
    /// Error occurred.
    Error(String),
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the macro series feed client.
#[derive(Debug, Clone)]
pub struct MacroFeedConfig {
    /// WebSocket URL.
    pub url: String,
    /// API credentials.
    pub credentials: Credentials,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
    /// Heartbeat configuration.
    pub heartbeat: HeartbeatConfig,
}

impl MacroFeedConfig {
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

/// Tracks currently subscribed macro series names.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionState {
    /// Subscribed series names.
    pub series_names: Vec<String>,
}

impl SubscriptionState {
    /// Check if there are any active subscriptions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.series_names.is_empty()
    }

    /// Create a subscribe request to restore all subscriptions.
    #[must_use]
    pub fn to_subscribe_request(&self) -> Option<SubscriptionRequest> {
        if self.is_empty() {
            None
        } else {
            Some(SubscriptionRequest::subscribe().with_macro_series(self.series_names.clone()))
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// WebSocket client for the macro series feed.
pub struct MacroFeedClient {
    config: MacroFeedConfig,
    codec: JsonCodec,
    event_tx: mpsc::Sender<MacroFeedEvent>,
    cancel: CancellationToken,
    subscriptions: parking_lot::RwLock<SubscriptionState>,
}

impl MacroFeedClient {
    /// Create a new macro series feed client.
    #[must_use]
    pub fn new(
        config: MacroFeedConfig,
        event_tx: mpsc::Sender<MacroFeedEvent>,
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
    pub async fn run(self: Arc<Self>) -> Result<(), MacroFeedError> {
        let mut reconnect_policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("macro feed client cancelled");
                return Ok(());
            }

            match self.connect_and_run().await {
                Ok(()) => {
                    tracing::info!("macro feed connection closed gracefully");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "macro feed connection error");

                    let _ = self.event_tx.send(MacroFeedEvent::Disconnected).await;

                    if let Some(delay) = reconnect_policy.next_delay() {
                        let attempt = reconnect_policy.attempt_count();
                        tracing::info!(
                            attempt,
                            delay_ms = delay.as_millis(),
                            "reconnecting to macro feed"
                        );

                        let _ = self
                            .event_tx
                            .send(MacroFeedEvent::Reconnecting { attempt })
                            .await;

                        tokio::select! {
                            () = self.cancel.cancelled() => {
                                tracing::info!("macro feed client cancelled during reconnect delay");
                                return Ok(());
                            }
                            () = tokio::time::sleep(delay) => {}
                        }
                    } else {
                        return Err(MacroFeedError::MaxReconnectAttemptsExceeded);
                    }
                }
            }
        }
    }

    async fn connect_and_run(&self) -> Result<(), MacroFeedError> {
        tracing::info!(url = %self.config.url, "connecting to macro feed");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        let mut auth_handler = AuthHandler::new(self.config.credentials.clone());
        auth_handler.on_connected();
        let auth_req = auth_handler.create_auth_request();
        let auth_json = serde_json::to_string(&auth_req).map_err(|e| {
            MacroFeedError::ConnectionFailed(format!("failed to serialize auth: {e}"))
        })?;
        write
            .send(Message::Text(auth_json.into()))
            .await
            .map_err(|e| MacroFeedError::ConnectionFailed(format!("failed to send auth: {e}")))?;

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
                            return Err(MacroFeedError::ConnectionClosed);
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
                            return Err(MacroFeedError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            heartbeat_cancel.cancel();
                            return Err(e.into());
                        }
                        None => {
                            tracing::info!("WebSocket stream ended");
                            heartbeat_cancel.cancel();
                            return Err(MacroFeedError::ConnectionClosed);
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
    ) -> Result<(), MacroFeedError>
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
                        tracing::info!("macro feed authenticated");
                        let _ = self.event_tx.send(MacroFeedEvent::Connected).await;

                        let subs = self.subscriptions.read().clone();
                        if let Some(request) = subs.to_subscribe_request() {
                            self.send_subscribe(write, &request).await?;
                        }
                    }
                }
                ProviderMessage::Error(error) => {
                    tracing::error!(code = error.code, msg = %error.msg, "macro feed error");

                    if auth_handler.state() != AuthState::Authenticated {
                        return Err(auth_handler.on_error(&error).into());
                    }

                    let _ = self.event_tx.send(MacroFeedEvent::Error(error.msg)).await;
                }
                ProviderMessage::Subscription(sub) => {
                    tracing::debug!(series_names = ?sub.macro_series, "subscription confirmed");
                    let _ = self
                        .event_tx
                        .send(MacroFeedEvent::Subscribed { series_names: sub.macro_series })
                        .await;
                }
                ProviderMessage::MacroSeries(series) => {
                    let _ = self.event_tx.send(MacroFeedEvent::Series(series)).await;
                }
                _ => {
                    tracing::trace!("ignoring unhandled message type on macro feed");
                }
            }
        }

        Ok(())
    }

    async fn send_subscribe<W>(
        &self,
        write: &mut W,
        request: &SubscriptionRequest,
    ) -> Result<(), MacroFeedError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let json = serde_json::to_string(request).map_err(|e| {
            MacroFeedError::ConnectionFailed(format!("failed to serialize subscribe: {e}"))
        })?;

        tracing::debug!(series_names = ?request.macro_series, "sending subscribe request");

        write
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| MacroFeedError::ConnectionFailed(format!("failed to send subscribe: {e}")))?;

        Ok(())
    }

    /// Subscribe to additional macro series names.
    pub fn subscribe(&self, series_names: Vec<String>) {
        let mut subs = self.subscriptions.write();
        for name in series_names {
            if !subs.series_names.contains(&name) {
                subs.series_names.push(name);
            }
        }
    }

    /// Unsubscribe from macro series names.
    pub fn unsubscribe(&self, series_names: &[String]) {
        let mut subs = self.subscriptions.write();
        subs.series_names.retain(|s| !series_names.contains(s));
    }

    /// Get current subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> SubscriptionState {
        self.subscriptions.read().clone()
    }
}
