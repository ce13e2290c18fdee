//! Configuration Module
//!
//! Configuration loading and dependency injection for the proxy service.

mod settings;

pub use settings::{
    BroadcastSettings, ConfigError, Credentials, Environment, FeedUrls, ProxyConfig,
    ServerSettings, WebSocketSettings,
};
