//! Provider WebSocket Adapters
//!
//! Implements WebSocket clients for the upstream feed providers:
//!
//! - **Price**: security close/quote updates (JSON codec)
//! - **Macro**: macro indicator series observations (JSON codec)
//! - **News sentiment**: per-security sentiment scores (JSON codec)

pub mod auth;
pub mod codec;
pub mod heartbeat;
pub mod macro_feed;
pub mod messages;
pub mod news_sentiment_feed;
pub mod price_feed;
pub mod reconnect;

pub use auth::{AuthError, AuthHandler, AuthState, Credentials};
pub use codec::{CodecError, JsonCodec};
pub use heartbeat::{
    HeartbeatConfig, HeartbeatError, HeartbeatEvent, HeartbeatManager, HeartbeatState,
};
pub use macro_feed::{
    MacroFeedClient, MacroFeedConfig, MacroFeedError, MacroFeedEvent,
    SubscriptionState as MacroSubscriptionState,
};
pub use messages::*;
pub use news_sentiment_feed::{
    NewsSentimentFeedClient, NewsSentimentFeedConfig, NewsSentimentFeedError,
    NewsSentimentFeedEvent, SubscriptionState as NewsSentimentSubscriptionState,
};
pub use price_feed::{
    PriceFeedClient, PriceFeedConfig, PriceFeedError, PriceFeedEvent,
    SubscriptionState as PriceSubscriptionState,
};
pub use reconnect::{ReconnectConfig, ReconnectError, ReconnectPolicy};
