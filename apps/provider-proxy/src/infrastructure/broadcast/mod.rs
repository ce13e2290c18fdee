//! Broadcast Channel Adapters
//!
//! Implements message distribution using tokio broadcast channels
//! for efficient fan-out to multiple subscribers.
//!
//! # Architecture
//!
//! The `BroadcastHub` provides one channel per feed kind:
//! - Price updates
//! - Macro series observations
//! - News sentiment updates
//!
//! Each channel supports multiple receivers with configurable capacity.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::provider::messages::{
    MacroSeriesUpdateMessage, NewsSentimentUpdateMessage, PriceUpdateMessage,
};
use crate::BroadcastSettings;

// =============================================================================
// Broadcast Messages
// =============================================================================

/// Price update broadcast message.
#[derive(Debug, Clone)]
pub struct PriceBroadcast {
    /// The price update.
    pub price: PriceUpdateMessage,
}

/// Macro series update broadcast message.
#[derive(Debug, Clone)]
pub struct MacroSeriesBroadcast {
    /// The macro series observation.
    pub series: MacroSeriesUpdateMessage,
}

/// News sentiment update broadcast message.
#[derive(Debug, Clone)]
pub struct NewsSentimentBroadcast {
    /// The news sentiment update.
    pub sentiment: NewsSentimentUpdateMessage,
}

// =============================================================================
// Broadcast Hub
// =============================================================================

/// Configuration for broadcast channel capacities.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastConfig {
    /// Capacity for the price channel.
    pub prices_capacity: usize,
    /// Capacity for the macro series channel.
    pub macro_series_capacity: usize,
    /// Capacity for the news sentiment channel.
    pub news_sentiment_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            prices_capacity: 10_000,
            macro_series_capacity: 1_000,
            news_sentiment_capacity: 5_000,
        }
    }
}

impl From<BroadcastSettings> for BroadcastConfig {
    fn from(settings: BroadcastSettings) -> Self {
        Self {
            prices_capacity: settings.prices_capacity,
            macro_series_capacity: settings.macro_series_capacity,
            news_sentiment_capacity: settings.news_sentiment_capacity,
        }
    }
}

/// Central hub for all broadcast channels.
///
/// Provides one channel per feed kind with configurable capacities.
/// Supports multiple receivers per channel.
///
/// # Example
///
/// ```rust
/// use provider_proxy::infrastructure::broadcast::{BroadcastHub, BroadcastConfig};
///
/// let hub = BroadcastHub::new(BroadcastConfig::default());
///
/// // Get a receiver for price updates
/// let mut rx = hub.prices_rx();
///
/// // In another task, send prices
/// // hub.send_price(price);
/// ```
#[derive(Debug)]
#[allow(clippy::struct_field_names)]
pub struct BroadcastHub {
    prices_tx: broadcast::Sender<PriceBroadcast>,
    macro_series_tx: broadcast::Sender<MacroSeriesBroadcast>,
    news_sentiment_tx: broadcast::Sender<NewsSentimentBroadcast>,
}

impl BroadcastHub {
    /// Create a new broadcast hub with the given configuration.
    #[must_use]
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            prices_tx: broadcast::channel(config.prices_capacity).0,
            macro_series_tx: broadcast::channel(config.macro_series_capacity).0,
            news_sentiment_tx: broadcast::channel(config.news_sentiment_capacity).0,
        }
    }

    /// Create a new broadcast hub with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BroadcastConfig::default())
    }

    // =========================================================================
    // Price Channel
    // =========================================================================

    /// Send a price update to all subscribers.
    ///
    /// Returns the number of receivers that received the message, or `None`
    /// if there are no active receivers.
    #[must_use]
    pub fn send_price(&self, price: PriceUpdateMessage) -> Option<usize> {
        self.prices_tx.send(PriceBroadcast { price }).ok()
    }

    /// Get a new receiver for price updates.
    #[must_use]
    pub fn prices_rx(&self) -> broadcast::Receiver<PriceBroadcast> {
        self.prices_tx.subscribe()
    }

    /// Get the number of active price receivers.
    #[must_use]
    pub fn prices_receiver_count(&self) -> usize {
        self.prices_tx.receiver_count()
    }

    // =========================================================================
    // Macro Series Channel
    // =========================================================================

    /// Send a macro series observation to all subscribers.
    #[must_use]
    pub fn send_macro_series(&self, series: MacroSeriesUpdateMessage) -> Option<usize> {
        self.macro_series_tx.send(MacroSeriesBroadcast { series }).ok()
    }

    /// Get a new receiver for macro series observations.
    #[must_use]
    pub fn macro_series_rx(&self) -> broadcast::Receiver<MacroSeriesBroadcast> {
        self.macro_series_tx.subscribe()
    }

    /// Get the number of active macro series receivers.
    #[must_use]
    pub fn macro_series_receiver_count(&self) -> usize {
        self.macro_series_tx.receiver_count()
    }

    // =========================================================================
    // News Sentiment Channel
    // =========================================================================

    /// Send a news sentiment update to all subscribers.
    #[must_use]
    pub fn send_news_sentiment(&self, sentiment: NewsSentimentUpdateMessage) -> Option<usize> {
        self.news_sentiment_tx
            .send(NewsSentimentBroadcast { sentiment })
            .ok()
    }

    /// Get a new receiver for news sentiment updates.
    #[must_use]
    pub fn news_sentiment_rx(&self) -> broadcast::Receiver<NewsSentimentBroadcast> {
        self.news_sentiment_tx.subscribe()
    }

    /// Get the number of active news sentiment receivers.
    #[must_use]
    pub fn news_sentiment_receiver_count(&self) -> usize {
        self.news_sentiment_tx.receiver_count()
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Get statistics about all channels.
    #[must_use]
    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            prices_receivers: self.prices_receiver_count(),
            macro_series_receivers: self.macro_series_receiver_count(),
            news_sentiment_receivers: self.news_sentiment_receiver_count(),
        }
    }
}

/// Shared broadcast hub reference.
pub type SharedBroadcastHub = Arc<BroadcastHub>;

/// Statistics about broadcast channels.
#[derive(Debug, Clone, Default)]
pub struct BroadcastStats {
    /// Number of price receivers.
    pub prices_receivers: usize,
    /// Number of macro series receivers.
    pub macro_series_receivers: usize,
    /// Number of news sentiment receivers.
    pub news_sentiment_receivers: usize,
}

impl BroadcastStats {
    /// Get total number of receivers across all channels.
    #[must_use]
    pub const fn total_receivers(&self) -> usize {
        self.prices_receivers + self.macro_series_receivers + self.news_sentiment_receivers
    }
}

// =============================================================================
// Tests
// =============================================================================
