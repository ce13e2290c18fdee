//! JSON wire codec for provider feed messages.
//!
//! Providers send either a single JSON object or a JSON array of objects
//! per WebSocket text frame; both shapes decode to the same
//! [`ProviderMessage`] variants via the `"type"` discriminator field.

use serde_json::Value;

use super::messages::ProviderMessage;

/// Errors decoding or encoding provider feed messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Message carried no recognized `"type"` discriminator.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// An empty array was received where at least one message was expected.
    #[error("empty message array")]
    EmptyArray,

    /// Message was not a JSON object or array of objects.
    #[error("invalid message format")]
    InvalidFormat,
}

/// Decodes/encodes the JSON wire protocol shared by all three provider
/// feeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into one or more messages.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the frame is not valid JSON, is an empty
    /// array, or contains an object without a recognized `"type"` field.
    pub fn decode(&self, text: &str) -> Result<Vec<ProviderMessage>, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(CodecError::EmptyArray);
                }
                items.into_iter().map(Self::decode_single_object).collect()
            }
            Value::Object(_) => Ok(vec![Self::decode_single_object(value)?]),
            _ => Err(CodecError::InvalidFormat),
        }
    }

    fn decode_single_object(value: Value) -> Result<ProviderMessage, CodecError> {
        let msg_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CodecError::UnknownMessageType("<missing type field>".to_string()))?
            .to_string();

        match msg_type.as_str() {
            "success" => Ok(ProviderMessage::Success(serde_json::from_value(value)?)),
            "error" => Ok(ProviderMessage::Error(serde_json::from_value(value)?)),
            "subscription" => Ok(ProviderMessage::Subscription(serde_json::from_value(value)?)),
            "price" => Ok(ProviderMessage::Price(serde_json::from_value(value)?)),
            "macro" => Ok(ProviderMessage::MacroSeries(serde_json::from_value(value)?)),
            "news_sentiment" => Ok(ProviderMessage::NewsSentiment(serde_json::from_value(value)?)),
            other => Err(CodecError::UnknownMessageType(other.to_string())),
        }
    }

    /// Encode a value to a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if serialization fails.
    pub fn encode<T: serde::Serialize>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_single_price_object() {
        let codec = JsonCodec::new();
        let json = r#"{"type":"price","security_id":"AAPL","close":"190.25","currency":"USD","source":"primary","timestamp":"2026-07-27T20:00:00Z"}"#;
        let messages = codec.decode(json).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ProviderMessage::Price(_)));
    }

    #[test]
    fn decode_array_of_mixed_messages() {
        let codec = JsonCodec::new();
        let json = r#"[
            {"type":"price","security_id":"AAPL","close":"190.25","currency":"USD","source":"primary","timestamp":"2026-07-27T20:00:00Z"},
            {"type":"macro","series_name":"CPI_YOY","value":"3.2","source":"primary","timestamp":"2026-07-27T20:00:00Z"}
        ]"#;
        let messages = codec.decode(json).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ProviderMessage::Price(_)));
        assert!(matches!(messages[1], ProviderMessage::MacroSeries(_)));
    }

    #[test]
    fn decode_empty_array_is_an_error() {
        let codec = JsonCodec::new();
        assert!(matches!(codec.decode("[]"), Err(CodecError::EmptyArray)));
    }

    #[test]
    fn decode_unknown_type_is_an_error() {
        let codec = JsonCodec::new();
        let json = r#"{"type":"unknown_kind"}"#;
        assert!(matches!(codec.decode(json), Err(CodecError::UnknownMessageType(_))));
    }

    #[test]
    fn decode_missing_type_field_is_an_error() {
        let codec = JsonCodec::new();
        let json = r#"{"security_id":"AAPL"}"#;
        assert!(matches!(codec.decode(json), Err(CodecError::UnknownMessageType(_))));
    }

    #[test]
    fn decode_non_object_non_array_is_invalid() {
        let codec = JsonCodec::new();
        assert!(matches!(codec.decode("\"just a string\""), Err(CodecError::InvalidFormat)));
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let codec = JsonCodec::new();
        let req = super::super::messages::SubscriptionRequest::subscribe()
            .with_prices(vec!["AAPL".to_string()]);
        let json = codec.encode(&req).unwrap();
        assert!(json.contains("\"prices\":[\"AAPL\"]"));
    }
}
