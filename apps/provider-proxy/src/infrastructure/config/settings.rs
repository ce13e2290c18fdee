//! Proxy Configuration Settings
//!
//! Configuration types for the provider proxy, loaded from environment
//! variables.

use std::time::Duration;

/// Deployment environment reported on the connection status RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Paper/sandbox environment.
    #[default]
    Paper,
    /// Live production environment.
    Live,
}

impl Environment {
    /// Parse environment from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "LIVE" => Self::Live,
            _ => Self::Paper,
        }
    }

    /// Check if this is the live environment.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Live => "live",
        }
    }
}

/// Provider API credentials.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }

    /// Get the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the API secret.
    #[must_use]
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// WebSocket connection settings, shared by all three upstream feed clients.
#[derive(Debug, Clone)]
pub struct WebSocketSettings {
    /// Heartbeat ping interval.
    pub heartbeat_interval: Duration,
    /// Heartbeat timeout before considering connection dead.
    pub heartbeat_timeout: Duration,
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub reconnect_delay_multiplier: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(60),
            reconnect_delay_initial: Duration::from_millis(500),
            reconnect_delay_max: Duration::from_secs(30),
            reconnect_delay_multiplier: 2.0,
            max_reconnect_attempts: 0, // Unlimited
        }
    }
}

/// Broadcast channel settings.
#[derive(Debug, Clone)]
pub struct BroadcastSettings {
    /// Capacity of the price broadcast channel.
    pub prices_capacity: usize,
    /// Capacity of the macro series broadcast channel.
    pub macro_series_capacity: usize,
    /// Capacity of the news sentiment broadcast channel.
    pub news_sentiment_capacity: usize,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            prices_capacity: 10_000,
            macro_series_capacity: 1_000,
            news_sentiment_capacity: 5_000,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// gRPC server port.
    pub grpc_port: u16,
    /// Health check HTTP port.
    pub health_port: u16,
    /// Prometheus metrics port (0 = disabled).
    pub metrics_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            grpc_port: 50052,
            health_port: 8082,
            metrics_port: 9090,
        }
    }
}

/// Upstream feed endpoint settings, one WebSocket URL per feed kind.
#[derive(Debug, Clone)]
pub struct FeedUrls {
    /// Price feed WebSocket URL.
    pub price: String,
    /// Macro series feed WebSocket URL.
    pub r#macro: String,
    /// News sentiment feed WebSocket URL.
    pub news_sentiment: String,
}

impl Default for FeedUrls {
    fn default() -> Self {
        Self {
            price: "wss://feeds.truth-spine.internal/v1/price".to_string(),
            r#macro: "wss://feeds.truth-spine.internal/v1/macro".to_string(),
            news_sentiment: "wss://feeds.truth-spine.internal/v1/news-sentiment".to_string(),
        }
    }
}

/// Complete proxy configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Deployment environment.
    pub environment: Environment,
    /// API credentials shared by all three upstream feeds.
    pub credentials: Credentials,
    /// Upstream feed WebSocket URLs.
    pub feed_urls: FeedUrls,
    /// Server port settings.
    pub server: ServerSettings,
    /// WebSocket connection settings.
    pub websocket: WebSocketSettings,
    /// Broadcast channel settings.
    pub broadcast: BroadcastSettings,
}

impl ProxyConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("PROVIDER_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("PROVIDER_KEY".to_string()))?;

        let api_secret = std::env::var("PROVIDER_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("PROVIDER_SECRET".to_string()))?;

        if api_key.is_empty() {
            return Err(ConfigError::EmptyValue("PROVIDER_KEY".to_string()));
        }

        if api_secret.is_empty() {
            return Err(ConfigError::EmptyValue("PROVIDER_SECRET".to_string()));
        }

        let environment = std::env::var("TRUTH_SPINE_ENV")
            .map(|s| Environment::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let feed_urls = FeedUrls {
            price: std::env::var("PRICE_FEED_URL").unwrap_or_else(|_| FeedUrls::default().price),
            r#macro: std::env::var("MACRO_FEED_URL").unwrap_or_else(|_| FeedUrls::default().r#macro),
            news_sentiment: std::env::var("NEWS_SENTIMENT_FEED_URL")
                .unwrap_or_else(|_| FeedUrls::default().news_sentiment),
        };

        let server = ServerSettings {
            grpc_port: parse_env_u16(
                "PROVIDER_PROXY_GRPC_PORT",
                ServerSettings::default().grpc_port,
            ),
            health_port: parse_env_u16(
                "PROVIDER_PROXY_HEALTH_PORT",
                ServerSettings::default().health_port,
            ),
            metrics_port: parse_env_u16(
                "PROVIDER_PROXY_METRICS_PORT",
                ServerSettings::default().metrics_port,
            ),
        };

        let websocket = WebSocketSettings {
            heartbeat_interval: parse_env_duration_secs(
                "PROVIDER_PROXY_HEARTBEAT_INTERVAL_SECS",
                WebSocketSettings::default().heartbeat_interval,
            ),
            heartbeat_timeout: parse_env_duration_secs(
                "PROVIDER_PROXY_HEARTBEAT_TIMEOUT_SECS",
                WebSocketSettings::default().heartbeat_timeout,
            ),
            reconnect_delay_initial: parse_env_duration_millis(
                "PROVIDER_PROXY_RECONNECT_DELAY_INITIAL_MS",
                WebSocketSettings::default().reconnect_delay_initial,
            ),
            reconnect_delay_max: parse_env_duration_secs(
                "PROVIDER_PROXY_RECONNECT_DELAY_MAX_SECS",
                WebSocketSettings::default().reconnect_delay_max,
            ),
            reconnect_delay_multiplier: parse_env_f64(
                "PROVIDER_PROXY_RECONNECT_DELAY_MULTIPLIER",
                WebSocketSettings::default().reconnect_delay_multiplier,
            ),
            max_reconnect_attempts: parse_env_u32(
                "PROVIDER_PROXY_MAX_RECONNECT_ATTEMPTS",
                WebSocketSettings::default().max_reconnect_attempts,
            ),
        };

        let broadcast = BroadcastSettings {
            prices_capacity: parse_env_usize(
                "PROVIDER_PROXY_PRICES_CAPACITY",
                BroadcastSettings::default().prices_capacity,
            ),
            macro_series_capacity: parse_env_usize(
                "PROVIDER_PROXY_MACRO_SERIES_CAPACITY",
                BroadcastSettings::default().macro_series_capacity,
            ),
            news_sentiment_capacity: parse_env_usize(
                "PROVIDER_PROXY_NEWS_SENTIMENT_CAPACITY",
                BroadcastSettings::default().news_sentiment_capacity,
            ),
        };

        Ok(Self {
            environment,
            credentials: Credentials::new(api_key, api_secret),
            feed_urls,
            server,
            websocket,
            broadcast,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(
            Environment::from_str_case_insensitive("live"),
            Environment::Live
        );
        assert_eq!(
            Environment::from_str_case_insensitive("LIVE"),
            Environment::Live
        );
        assert_eq!(
            Environment::from_str_case_insensitive("paper"),
            Environment::Paper
        );
        assert_eq!(
            Environment::from_str_case_insensitive("unknown"),
            Environment::Paper
        );
    }

    #[test]
    fn environment_is_live() {
        assert!(Environment::Live.is_live());
        assert!(!Environment::Paper.is_live());
    }

    #[test]
    fn credentials_redacted_debug() {
        let creds = Credentials::new("key123".to_string(), "secret456".to_string());
        let debug = format!("{creds:?}");
        assert!(!debug.contains("key123"));
        assert!(!debug.contains("secret456"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn websocket_settings_defaults() {
        let settings = WebSocketSettings::default();
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(settings.heartbeat_timeout, Duration::from_secs(60));
        assert_eq!(settings.reconnect_delay_initial, Duration::from_millis(500));
        assert_eq!(settings.reconnect_delay_max, Duration::from_secs(30));
        assert!((settings.reconnect_delay_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn broadcast_settings_defaults() {
        let settings = BroadcastSettings::default();
        assert_eq!(settings.prices_capacity, 10_000);
        assert_eq!(settings.news_sentiment_capacity, 5_000);
    }

    #[test]
    fn server_settings_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.grpc_port, 50052);
        assert_eq!(settings.health_port, 8082);
        assert_eq!(settings.metrics_port, 9090);
    }

    #[test]
    fn feed_urls_defaults_are_distinct() {
        let urls = FeedUrls::default();
        assert_ne!(urls.price, urls.r#macro);
        assert_ne!(urls.r#macro, urls.news_sentiment);
    }
}
