//! Price and FX rate providers consulted by the pricing pack builder.
//!
//! Grounded on the broker price-feed adapters: a thin `reqwest::Client`
//! wrapper per provider, `async_trait` for the port, non-2xx responses
//! mapped to a typed error rather than propagated as `reqwest::Error`.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::shared::Symbol;

/// A single security close fetched from a provider.
#[derive(Debug, Clone)]
pub struct PriceQuote {
    pub security_id: Symbol,
    pub close: Decimal,
    pub currency: String,
}

/// A single currency pair rate fetched from a provider.
#[derive(Debug, Clone)]
pub struct FxQuote {
    pub base_ccy: String,
    pub quote_ccy: String,
    pub rate: Decimal,
}

/// Errors a provider call can fail with.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error calling {provider}: {message}")]
    Network { provider: String, message: String },
    #[error("{provider} has no quote for {key}")]
    NotFound { provider: String, key: String },
    #[error("{provider} returned an unparseable response: {message}")]
    InvalidResponse { provider: String, message: String },
    #[error("{provider} is rate-limited or circuit-open")]
    Unavailable { provider: String },
}

impl ProviderError {
    /// Whether this failure is worth falling back to the next provider for,
    /// as opposed to a permanent misconfiguration.
    #[must_use]
    pub const fn is_retryable_elsewhere(&self) -> bool {
        !matches!(self, Self::InvalidResponse { .. })
    }
}

/// A source of security closing prices.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Stable provider name, recorded in the pack's sources manifest.
    fn name(&self) -> &str;

    /// Fetch the close for one security as of `asof_date`.
    async fn fetch_close(&self, security_id: &Symbol, asof_date: NaiveDate) -> Result<PriceQuote, ProviderError>;
}

/// A source of FX fixing rates.
#[async_trait]
pub trait FxProvider: Send + Sync {
    /// Stable provider name, recorded in the pack's sources manifest.
    fn name(&self) -> &str;

    /// Fetch the fixing rate for `base/quote` as of `asof_date`.
    async fn fetch_rate(&self, base_ccy: &str, quote_ccy: &str, asof_date: NaiveDate) -> Result<FxQuote, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct CloseResponse {
    close: Decimal,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct FxResponse {
    rate: Decimal,
}

/// An HTTP-backed price provider hitting a REST close-price endpoint.
#[derive(Debug)]
pub struct HttpPriceProvider {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
}

impl HttpPriceProvider {
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl PriceProvider for HttpPriceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_close(&self, security_id: &Symbol, asof_date: NaiveDate) -> Result<PriceQuote, ProviderError> {
        let url = format!("{}/v1/closes/{}", self.base_url, security_id.as_str());
        let response = self
            .client
            .get(&url)
            .query(&[("asof", asof_date.to_string())])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network {
                provider: self.name.clone(),
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                provider: self.name.clone(),
                key: security_id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ProviderError::Network {
                provider: self.name.clone(),
                message: response.status().to_string(),
            });
        }

        let body: CloseResponse = response.json().await.map_err(|e| ProviderError::InvalidResponse {
            provider: self.name.clone(),
            message: e.to_string(),
        })?;

        Ok(PriceQuote {
            security_id: security_id.clone(),
            close: body.close,
            currency: body.currency,
        })
    }
}

/// An HTTP-backed FX provider hitting a REST fixing-rate endpoint.
#[derive(Debug)]
pub struct HttpFxProvider {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
}

impl HttpFxProvider {
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl FxProvider for HttpFxProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rate(&self, base_ccy: &str, quote_ccy: &str, asof_date: NaiveDate) -> Result<FxQuote, ProviderError> {
        let url = format!("{}/v1/fx/{base_ccy}{quote_ccy}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("asof", asof_date.to_string())])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network {
                provider: self.name.clone(),
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                provider: self.name.clone(),
                key: format!("{base_ccy}/{quote_ccy}"),
            });
        }
        if !response.status().is_success() {
            return Err(ProviderError::Network {
                provider: self.name.clone(),
                message: response.status().to_string(),
            });
        }

        let body: FxResponse = response.json().await.map_err(|e| ProviderError::InvalidResponse {
            provider: self.name.clone(),
            message: e.to_string(),
        })?;

        Ok(FxQuote {
            base_ccy: base_ccy.to_string(),
            quote_ccy: quote_ccy.to_string(),
            rate: body.rate,
        })
    }
}
