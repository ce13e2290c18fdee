//! Subscription Management Types
//!
//! Domain types for tracking client subscriptions to provider feeds.
//! Handles subscription state, filtering, and aggregation.
//!
//! # Design
//!
//! The subscription manager tracks:
//! - Which identifiers (security ids, macro series names, news entity ids)
//!   each consumer is subscribed to
//! - Reference counting for upstream subscriptions
//! - Separate tracking per feed kind (price, macro, news sentiment)
//!
//! This allows multiple consumers to subscribe to the same identifier
//! while maintaining only one upstream subscription.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

// =============================================================================
// Types
// =============================================================================

/// Unique identifier for a consumer (gRPC client).
pub type ConsumerId = u64;

/// An identifier within a feed: a security id for price feeds, a series
/// name for macro feeds, an entity id for news-sentiment feeds.
pub type Symbol = String;

/// Which upstream provider feed a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionType {
    /// Security close/quote price feed.
    Price,
    /// Macro indicator series feed.
    Macro,
    /// News sentiment score feed.
    NewsSentiment,
}

impl SubscriptionType {
    /// Get all subscription types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Price, Self::Macro, Self::NewsSentiment]
    }
}

// =============================================================================
// Subscription Changes
// =============================================================================

/// Changes to upstream subscriptions.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionChanges {
    /// Identifiers to subscribe to.
    pub subscribe: HashSet<Symbol>,
    /// Identifiers to unsubscribe from.
    pub unsubscribe: HashSet<Symbol>,
}

impl SubscriptionChanges {
    /// Check if there are any changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribe.is_empty() && self.unsubscribe.is_empty()
    }

    /// Create changes with only subscribes.
    #[must_use]
    pub fn subscribe_only(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            subscribe: symbols.into_iter().collect(),
            unsubscribe: HashSet::new(),
        }
    }

    /// Create changes with only unsubscribes.
    #[must_use]
    pub fn unsubscribe_only(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            subscribe: HashSet::new(),
            unsubscribe: symbols.into_iter().collect(),
        }
    }
}

// =============================================================================
// Subscription State (per subscription type)
// =============================================================================

/// Tracks subscriptions for a single subscription type.
#[derive(Debug, Default)]
struct TypeSubscriptionState {
    /// Map from consumer ID to their subscribed identifiers.
    consumer_symbols: HashMap<ConsumerId, HashSet<Symbol>>,
    /// Map from identifier to reference count.
    symbol_refcount: HashMap<Symbol, usize>,
}

impl TypeSubscriptionState {
    /// Add subscriptions for a consumer.
    ///
    /// Returns symbols that need upstream subscription (refcount went 0→1).
    fn add(&mut self, consumer: ConsumerId, symbols: &[Symbol]) -> Vec<Symbol> {
        let consumer_set = self.consumer_symbols.entry(consumer).or_default();
        let mut new_upstream = Vec::new();

        for symbol in symbols {
            // Skip if consumer already subscribed
            if consumer_set.contains(symbol) {
                continue;
            }

            consumer_set.insert(symbol.clone());

            let refcount = self.symbol_refcount.entry(symbol.clone()).or_insert(0);
            *refcount += 1;

            // First subscription - needs upstream subscribe
            if *refcount == 1 {
                new_upstream.push(symbol.clone());
            }
        }

        new_upstream
    }

    /// Remove subscriptions for a consumer.
    ///
    /// Returns symbols that need upstream unsubscription (refcount went 1→0).
    fn remove(&mut self, consumer: ConsumerId, symbols: &[Symbol]) -> Vec<Symbol> {
        let Some(consumer_set) = self.consumer_symbols.get_mut(&consumer) else {
            return vec![];
        };

        let mut remove_upstream = Vec::new();

        for symbol in symbols {
            // Skip if consumer wasn't subscribed
            if !consumer_set.remove(symbol) {
                continue;
            }

            if let Some(refcount) = self.symbol_refcount.get_mut(symbol) {
                *refcount = refcount.saturating_sub(1);

                // Last subscription removed - needs upstream unsubscribe
                if *refcount == 0 {
                    self.symbol_refcount.remove(symbol);
                    remove_upstream.push(symbol.clone());
                }
            }
        }

        // Clean up empty consumer entry
        if consumer_set.is_empty() {
            self.consumer_symbols.remove(&consumer);
        }

        remove_upstream
    }

    /// Remove all subscriptions for a consumer.
    ///
    /// Returns symbols that need upstream unsubscription.
    fn remove_consumer(&mut self, consumer: ConsumerId) -> Vec<Symbol> {
        let Some(consumer_set) = self.consumer_symbols.remove(&consumer) else {
            return vec![];
        };

        let symbols: Vec<_> = consumer_set.into_iter().collect();
        let mut remove_upstream = Vec::new();

        for symbol in &symbols {
            if let Some(refcount) = self.symbol_refcount.get_mut(symbol) {
                *refcount = refcount.saturating_sub(1);

                if *refcount == 0 {
                    self.symbol_refcount.remove(symbol);
                    remove_upstream.push(symbol.clone());
                }
            }
        }

        remove_upstream
    }

    /// Get all symbols with active subscriptions.
    fn active_symbols(&self) -> Vec<Symbol> {
        self.symbol_refcount.keys().cloned().collect()
    }

    /// Get symbols for a specific consumer.
    fn consumer_symbols(&self, consumer: ConsumerId) -> Vec<Symbol> {
        self.consumer_symbols
            .get(&consumer)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get total number of unique symbols.
    fn symbol_count(&self) -> usize {
        self.symbol_refcount.len()
    }

    /// Get total number of consumers.
    fn consumer_count(&self) -> usize {
        self.consumer_symbols.len()
    }
}

// =============================================================================
// Subscription Manager
// =============================================================================

/// Manages subscriptions across all consumers and feed kinds.
///
/// Thread-safe subscription manager that tracks:
/// - Per-consumer subscriptions
/// - Reference counting for shared identifiers
/// - Separate state for price, macro, and news-sentiment feeds
///
/// # Example
///
/// ```rust
/// use provider_proxy::domain::subscription::{SubscriptionManager, SubscriptionType};
///
/// let manager = SubscriptionManager::new();
///
/// // Consumer 1 subscribes to AAPL prices
/// let changes = manager.add_subscriptions(1, SubscriptionType::Price, &["AAPL".to_string()]);
/// assert!(changes.subscribe.contains("AAPL"));
/// assert!(changes.unsubscribe.is_empty());
///
/// // Consumer 2 also subscribes - no upstream change needed
/// let changes = manager.add_subscriptions(2, SubscriptionType::Price, &["AAPL".to_string()]);
/// assert!(changes.subscribe.is_empty());
///
/// // Consumer 1 unsubscribes - still subscribed via Consumer 2
/// let changes = manager.remove_subscriptions(1, SubscriptionType::Price, &["AAPL".to_string()]);
/// assert!(changes.unsubscribe.is_empty());
///
/// // Consumer 2 unsubscribes - now unsubscribe upstream
/// let changes = manager.remove_subscriptions(2, SubscriptionType::Price, &["AAPL".to_string()]);
/// assert!(changes.unsubscribe.contains("AAPL"));
/// ```
pub struct SubscriptionManager {
    price: RwLock<TypeSubscriptionState>,
    r#macro: RwLock<TypeSubscriptionState>,
    news_sentiment: RwLock<TypeSubscriptionState>,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            price: RwLock::new(TypeSubscriptionState::default()),
            r#macro: RwLock::new(TypeSubscriptionState::default()),
            news_sentiment: RwLock::new(TypeSubscriptionState::default()),
        }
    }

    /// Add subscriptions for a consumer.
    ///
    /// Returns changes that need to be applied upstream.
    pub fn add_subscriptions(
        &self,
        consumer: ConsumerId,
        sub_type: SubscriptionType,
        symbols: &[Symbol],
    ) -> SubscriptionChanges {
        let state = self.get_state(sub_type);
        let new_symbols = state.write().add(consumer, symbols);

        SubscriptionChanges::subscribe_only(new_symbols)
    }

    /// Remove subscriptions for a consumer.
    ///
    /// Returns changes that need to be applied upstream.
    pub fn remove_subscriptions(
        &self,
        consumer: ConsumerId,
        sub_type: SubscriptionType,
        symbols: &[Symbol],
    ) -> SubscriptionChanges {
        let state = self.get_state(sub_type);
        let removed_symbols = state.write().remove(consumer, symbols);

        SubscriptionChanges::unsubscribe_only(removed_symbols)
    }

    /// Handle consumer disconnection.
    ///
    /// Removes all subscriptions for the consumer and returns changes
    /// that need to be applied upstream (for each subscription type).
    pub fn consumer_disconnected(
        &self,
        consumer: ConsumerId,
    ) -> HashMap<SubscriptionType, SubscriptionChanges> {
        let mut changes = HashMap::new();

        for sub_type in SubscriptionType::all() {
            let state = self.get_state(*sub_type);
            let removed = state.write().remove_consumer(consumer);

            if !removed.is_empty() {
                changes.insert(*sub_type, SubscriptionChanges::unsubscribe_only(removed));
            }
        }

        changes
    }

    /// Get all active symbols for a subscription type.
    #[must_use]
    pub fn active_symbols(&self, sub_type: SubscriptionType) -> Vec<Symbol> {
        self.get_state(sub_type).read().active_symbols()
    }

    /// Get symbols for a specific consumer.
    #[must_use]
    pub fn consumer_symbols(
        &self,
        consumer: ConsumerId,
        sub_type: SubscriptionType,
    ) -> Vec<Symbol> {
        self.get_state(sub_type).read().consumer_symbols(consumer)
    }

    /// Get statistics for a subscription type.
    #[must_use]
    pub fn stats(&self, sub_type: SubscriptionType) -> SubscriptionStats {
        let state = self.get_state(sub_type).read();
        SubscriptionStats {
            symbol_count: state.symbol_count(),
            consumer_count: state.consumer_count(),
        }
    }

    /// Get overall statistics.
    #[must_use]
    pub fn total_stats(&self) -> TotalSubscriptionStats {
        TotalSubscriptionStats {
            price: self.stats(SubscriptionType::Price),
            r#macro: self.stats(SubscriptionType::Macro),
            news_sentiment: self.stats(SubscriptionType::NewsSentiment),
        }
    }

    /// Get the state for a subscription type.
    const fn get_state(&self, sub_type: SubscriptionType) -> &RwLock<TypeSubscriptionState> {
        match sub_type {
            SubscriptionType::Price => &self.price,
            SubscriptionType::Macro => &self.r#macro,
            SubscriptionType::NewsSentiment => &self.news_sentiment,
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Statistics for a single subscription type.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionStats {
    /// Number of unique symbols.
    pub symbol_count: usize,
    /// Number of consumers.
    pub consumer_count: usize,
}

/// Overall subscription statistics.
#[derive(Debug, Clone, Default)]
pub struct TotalSubscriptionStats {
    /// Price feed subscription stats.
    pub price: SubscriptionStats,
    /// Macro feed subscription stats.
    pub r#macro: SubscriptionStats,
    /// News-sentiment feed subscription stats.
    pub news_sentiment: SubscriptionStats,
}

// =============================================================================
// Tests
// =============================================================================
