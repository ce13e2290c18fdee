//! Wire message types for the upstream provider WebSocket feeds.
//!
//! All three feeds (price, macro, news sentiment) share one JSON wire
//! protocol: a `"type"` discriminator field selects control messages
//! (`success`, `error`, `subscription`) or one of the three update kinds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Control Messages
// =============================================================================

/// Successful control acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SuccessMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub msg: SuccessKind,
}

/// What a success message is acknowledging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessKind {
    Authenticated,
    Unsubscribed,
}

/// Provider-reported error.
///
/// Codes follow the same numbering a market-data vendor would use:
/// 401 invalid credentials, 402 auth timeout, 403 already authenticated,
/// 404 not authenticated, 405 connection limit exceeded, 406 invalid
/// message, 409 insufficient subscription, 500 internal error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub code: i32,
    pub msg: String,
}

impl ErrorMessage {
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self.code, 401 | 402 | 403 | 404 | 405)
    }

    #[must_use]
    pub const fn is_rate_limit_error(&self) -> bool {
        self.code == 406
    }

    #[must_use]
    pub const fn is_subscription_error(&self) -> bool {
        self.code == 409
    }
}

/// Subscription confirmation: the full set of identifiers now active per
/// feed kind, echoed back by the upstream after a subscribe/unsubscribe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscriptionMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub prices: Vec<String>,
    #[serde(default)]
    pub macro_series: Vec<String>,
    #[serde(default)]
    pub news_sentiment: Vec<String>,
}

// =============================================================================
// Feed Update Messages
// =============================================================================

/// A security close/quote price update.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub security_id: String,
    pub close: Decimal,
    pub currency: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

/// A single observation of a macro indicator series.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MacroSeriesUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub series_name: String,
    pub value: Decimal,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

/// A news sentiment score update for a security, in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsSentimentUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub security_id: String,
    pub score: Decimal,
    pub source: String,
    #[serde(default)]
    pub headline: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Outbound Requests
// =============================================================================

/// Authentication request sent immediately after connecting.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    pub action: String,
    pub key: String,
    pub secret: String,
}

impl AuthRequest {
    #[must_use]
    pub fn new(key: &str, secret: &str) -> Self {
        Self { action: "auth".to_string(), key: key.to_string(), secret: secret.to_string() }
    }
}

/// Subscribe/unsubscribe request naming identifiers per feed kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscriptionRequest {
    pub action: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub macro_series: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub news_sentiment: Vec<String>,
}

impl SubscriptionRequest {
    #[must_use]
    pub fn subscribe() -> Self {
        Self { action: "subscribe".to_string(), ..Self::default() }
    }

    #[must_use]
    pub fn unsubscribe() -> Self {
        Self { action: "unsubscribe".to_string(), ..Self::default() }
    }

    #[must_use]
    pub fn with_prices(mut self, ids: Vec<String>) -> Self {
        self.prices = ids;
        self
    }

    #[must_use]
    pub fn with_macro_series(mut self, names: Vec<String>) -> Self {
        self.macro_series = names;
        self
    }

    #[must_use]
    pub fn with_news_sentiment(mut self, ids: Vec<String>) -> Self {
        self.news_sentiment = ids;
        self
    }
}

// =============================================================================
// Unified Message Enum
// =============================================================================

/// Any message the provider feed can send, dispatched by
/// [`super::codec::JsonCodec`] on the `"type"` discriminator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ProviderMessage {
    Success(SuccessMessage),
    Error(ErrorMessage),
    Subscription(SubscriptionMessage),
    Price(PriceUpdateMessage),
    MacroSeries(MacroSeriesUpdateMessage),
    NewsSentiment(NewsSentimentUpdateMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn error_classification() {
        let auth_err = ErrorMessage { msg_type: "error".to_string(), code: 401, msg: "invalid key".to_string() };
        assert!(auth_err.is_auth_error());
        assert!(!auth_err.is_rate_limit_error());

        let rate_err = ErrorMessage { msg_type: "error".to_string(), code: 406, msg: "slow down".to_string() };
        assert!(rate_err.is_rate_limit_error());

        let sub_err = ErrorMessage { msg_type: "error".to_string(), code: 409, msg: "not entitled".to_string() };
        assert!(sub_err.is_subscription_error());
    }

    #[test]
    fn deserialize_price_update() {
        let json = r#"{"type":"price","security_id":"AAPL","close":"190.25","currency":"USD","source":"primary","timestamp":"2026-07-27T20:00:00Z"}"#;
        let msg: ProviderMessage = serde_json::from_str(json).unwrap();
        match msg {
            ProviderMessage::Price(p) => {
                assert_eq!(p.security_id, "AAPL");
                assert_eq!(p.close, dec!(190.25));
            }
            other => panic!("expected Price, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_macro_series_update() {
        let json = r#"{"type":"macro","series_name":"CPI_YOY","value":"3.2","source":"primary","timestamp":"2026-07-27T20:00:00Z"}"#;
        let msg: ProviderMessage = serde_json::from_str(json).unwrap();
        match msg {
            ProviderMessage::MacroSeries(m) => {
                assert_eq!(m.series_name, "CPI_YOY");
                assert_eq!(m.value, dec!(3.2));
            }
            other => panic!("expected MacroSeries, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_news_sentiment_update() {
        let json = r#"{"type":"news_sentiment","security_id":"TSLA","score":"-0.4","source":"primary","headline":"Recall announced","timestamp":"2026-07-27T20:00:00Z"}"#;
        let msg: ProviderMessage = serde_json::from_str(json).unwrap();
        match msg {
            ProviderMessage::NewsSentiment(n) => {
                assert_eq!(n.security_id, "TSLA");
                assert_eq!(n.score, dec!(-0.4));
                assert_eq!(n.headline.as_deref(), Some("Recall announced"));
            }
            other => panic!("expected NewsSentiment, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_success_message() {
        let json = r#"{"type":"success","msg":"authenticated"}"#;
        let msg: ProviderMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ProviderMessage::Success(SuccessMessage { msg: SuccessKind::Authenticated, .. })
        ));
    }

    #[test]
    fn deserialize_subscription_message() {
        let json = r#"{"type":"subscription","prices":["AAPL","MSFT"],"macro_series":[],"news_sentiment":[]}"#;
        let msg: ProviderMessage = serde_json::from_str(json).unwrap();
        match msg {
            ProviderMessage::Subscription(s) => {
                assert_eq!(s.prices, vec!["AAPL".to_string(), "MSFT".to_string()]);
            }
            other => panic!("expected Subscription, got {other:?}"),
        }
    }

    #[test]
    fn serialize_auth_request() {
        let req = AuthRequest::new("key123", "secret456");
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"action\":\"auth\""));
        assert!(json.contains("\"key\":\"key123\""));
    }

    #[test]
    fn subscription_request_builder_omits_empty_vecs() {
        let req = SubscriptionRequest::subscribe().with_prices(vec!["AAPL".to_string()]);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"prices\":[\"AAPL\"]"));
        assert!(!json.contains("macro_series"));
        assert!(!json.contains("news_sentiment"));
    }
}
