//! The nightly pricing pack builder.
//!
//! `build` is idempotent for a given `(asof_date, policy)`: called again
//! without a `reason` it returns the existing fresh pack rather than
//! rebuilding. Passing a `reason` forces a rebuild and chains the new pack
//! in as the supersede of the old one — the restatement path.
//!
//! Every provider call goes through that provider's circuit breaker and
//! rate limiter first; a security or FX pair that both providers fail to
//! price is logged and skipped, not fatal. A pack with zero priced
//! securities (or, separately, zero priced FX pairs when pairs were
//! requested) is a total provider outage and fails the whole build — no
//! partial packs are ever inserted.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::warn;

use super::provider::{FxProvider, FxQuote, PriceProvider, PriceQuote, ProviderError};
use crate::domain::pricing_pack::{FxRate, Pack, PackStatus, Price, SourcesManifest, compute_pack_hash};
use crate::domain::shared::{PackId, Symbol};
use crate::infrastructure::persistence::{PersistenceError, PricingPackRepository};
use crate::observability;
use crate::resilience::{CircuitBreaker, TokenBucket};

/// Errors building a pricing pack.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Every provider failed to price every requested security.
    #[error("provider outage building pack for {asof_date} ({policy}): no security prices available")]
    PriceProviderOutage { asof_date: NaiveDate, policy: String },
    /// Every provider failed to price every requested FX pair.
    #[error("provider outage building pack for {asof_date} ({policy}): no FX rates available")]
    FxProviderOutage { asof_date: NaiveDate, policy: String },
    /// A repository call failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// One provider guarded by its circuit breaker and rate limiter.
struct GuardedProvider<P> {
    provider: Arc<P>,
    breaker: Arc<CircuitBreaker>,
    limiter: Arc<TokenBucket>,
}

/// Builds and persists pricing packs.
pub struct PricingPackBuilder {
    primary: GuardedProvider<dyn PriceProvider>,
    secondary: GuardedProvider<dyn PriceProvider>,
    fx: GuardedProvider<dyn FxProvider>,
    repo: Arc<dyn PricingPackRepository>,
}

impl PricingPackBuilder {
    /// Wire a builder from its providers (each with its own breaker and rate
    /// limiter) and the pack repository.
    #[must_use]
    pub fn new(
        primary: Arc<dyn PriceProvider>,
        primary_breaker: Arc<CircuitBreaker>,
        primary_limiter: Arc<TokenBucket>,
        secondary: Arc<dyn PriceProvider>,
        secondary_breaker: Arc<CircuitBreaker>,
        secondary_limiter: Arc<TokenBucket>,
        fx: Arc<dyn FxProvider>,
        fx_breaker: Arc<CircuitBreaker>,
        fx_limiter: Arc<TokenBucket>,
        repo: Arc<dyn PricingPackRepository>,
    ) -> Self {
        Self {
            primary: GuardedProvider {
                provider: primary,
                breaker: primary_breaker,
                limiter: primary_limiter,
            },
            secondary: GuardedProvider {
                provider: secondary,
                breaker: secondary_breaker,
                limiter: secondary_limiter,
            },
            fx: GuardedProvider {
                provider: fx,
                breaker: fx_breaker,
                limiter: fx_limiter,
            },
            repo,
        }
    }

    /// Build (or idempotently return) the pack for `(asof_date, policy)`.
    ///
    /// `reason` forces a rebuild and chains the result in as a supersede of
    /// the existing fresh pack, if one exists.
    pub async fn build(
        &self,
        asof_date: NaiveDate,
        policy: &str,
        securities: &[Symbol],
        fx_pairs: &[(String, String)],
        reason: Option<&str>,
    ) -> Result<PackId, BuilderError> {
        if reason.is_none() {
            if let Some(existing) = self.repo.latest_fresh(asof_date, policy).await? {
                return Ok(existing.id);
            }
        }

        let started = Instant::now();
        let mut manifest = SourcesManifest::new();

        let mut prices = Vec::with_capacity(securities.len());
        for security_id in securities {
            if let Some(quote) = self.fetch_close_with_fallback(security_id, asof_date, &mut manifest).await {
                prices.push(Price {
                    security_id: quote.security_id,
                    pricing_pack_id: PackId::new(""),
                    close: quote.close,
                    currency: quote.currency,
                    source: manifest.prices.last().cloned().unwrap_or_default(),
                });
            } else {
                warn!(security = %security_id, %asof_date, "no provider could price security, skipping");
            }
        }
        if !securities.is_empty() && prices.is_empty() {
            observability::record_pack_build("", "failed", started.elapsed().as_secs_f64());
            return Err(BuilderError::PriceProviderOutage {
                asof_date,
                policy: policy.to_string(),
            });
        }

        let mut rates = Vec::with_capacity(fx_pairs.len());
        for (base_ccy, quote_ccy) in fx_pairs {
            if let Some(quote) = self.fetch_fx(base_ccy, quote_ccy, asof_date, &mut manifest).await {
                rates.push(FxRate {
                    base_ccy: quote.base_ccy,
                    quote_ccy: quote.quote_ccy,
                    pricing_pack_id: PackId::new(""),
                    rate: quote.rate,
                    source: self.fx.provider.name().to_string(),
                });
            } else {
                warn!(%base_ccy, %quote_ccy, %asof_date, "no provider could fix FX rate, skipping");
            }
        }
        if !fx_pairs.is_empty() && rates.is_empty() {
            observability::record_pack_build("", "failed", started.elapsed().as_secs_f64());
            return Err(BuilderError::FxProviderOutage {
                asof_date,
                policy: policy.to_string(),
            });
        }

        let hash = compute_pack_hash(&prices, &rates);
        let pack_id = PackId::generate();
        for price in &mut prices {
            price.pricing_pack_id = pack_id.clone();
        }
        for rate in &mut rates {
            rate.pricing_pack_id = pack_id.clone();
        }

        let now = Utc::now();
        let pack = Pack {
            id: pack_id.clone(),
            asof_date,
            policy: policy.to_string(),
            hash,
            status: PackStatus::Warming,
            prewarm_done: false,
            superseded_by: None,
            sources: manifest,
            created_at: now,
            updated_at: now,
        };

        let previous = if reason.is_some() {
            self.repo.latest_fresh(asof_date, policy).await?
        } else {
            None
        };

        self.repo.insert_pack(pack, prices, rates).await?;

        if let Some(previous) = previous {
            self.repo.supersede(&previous.id, &pack_id).await?;
        }

        observability::record_pack_build(pack_id.as_str(), "complete", started.elapsed().as_secs_f64());
        Ok(pack_id)
    }

    /// Promote a `warming` pack to `fresh`. Called by the orchestrator after
    /// reconciliation passes.
    pub async fn mark_fresh(&self, pack_id: &PackId) -> Result<(), BuilderError> {
        self.repo.mark_fresh(pack_id).await?;
        Ok(())
    }

    async fn fetch_close_with_fallback(
        &self,
        security_id: &Symbol,
        asof_date: NaiveDate,
        manifest: &mut SourcesManifest,
    ) -> Option<PriceQuote> {
        if let Some(quote) = Self::try_price(&self.primary, security_id, asof_date).await {
            manifest.record_price_source(self.primary.provider.name());
            return Some(quote);
        }
        if let Some(quote) = Self::try_price(&self.secondary, security_id, asof_date).await {
            manifest.record_price_source(self.secondary.provider.name());
            return Some(quote);
        }
        None
    }

    async fn try_price(guarded: &GuardedProvider<dyn PriceProvider>, security_id: &Symbol, asof_date: NaiveDate) -> Option<PriceQuote> {
        if !guarded.breaker.is_call_permitted() {
            observability::record_circuit_breaker_rejected(guarded.provider.name());
            return None;
        }
        guarded.limiter.acquire().await;
        let started = Instant::now();
        match guarded.provider.fetch_close(security_id, asof_date).await {
            Ok(quote) => {
                guarded.breaker.record_success();
                observability::record_circuit_breaker_success(guarded.provider.name());
                observability::record_provider_fetch(guarded.provider.name(), "ok", started.elapsed().as_secs_f64());
                Some(quote)
            }
            Err(err) => {
                guarded.breaker.record_failure();
                observability::record_circuit_breaker_failure(guarded.provider.name());
                observability::record_provider_fetch(guarded.provider.name(), "error", started.elapsed().as_secs_f64());
                warn!(provider = guarded.provider.name(), security = %security_id, error = %err, "price fetch failed");
                None
            }
        }
    }

    async fn fetch_fx(
        &self,
        base_ccy: &str,
        quote_ccy: &str,
        asof_date: NaiveDate,
        manifest: &mut SourcesManifest,
    ) -> Option<FxQuote> {
        if !self.fx.breaker.is_call_permitted() {
            observability::record_circuit_breaker_rejected(self.fx.provider.name());
            return None;
        }
        self.fx.limiter.acquire().await;
        let started = Instant::now();
        match self.fx.provider.fetch_rate(base_ccy, quote_ccy, asof_date).await {
            Ok(quote) => {
                self.fx.breaker.record_success();
                observability::record_circuit_breaker_success(self.fx.provider.name());
                observability::record_provider_fetch(self.fx.provider.name(), "ok", started.elapsed().as_secs_f64());
                manifest.record_fx_source(self.fx.provider.name());
                Some(quote)
            }
            Err(err) => {
                self.fx.breaker.record_failure();
                observability::record_circuit_breaker_failure(self.fx.provider.name());
                observability::record_provider_fetch(self.fx.provider.name(), "error", started.elapsed().as_secs_f64());
                warn!(%base_ccy, %quote_ccy, error = %err, "fx fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::infrastructure::persistence::InMemoryPersistence;
    use crate::resilience::CircuitBreakerConfig;

    struct AlwaysPrices {
        name: &'static str,
        close: rust_decimal::Decimal,
    }

    #[async_trait]
    impl PriceProvider for AlwaysPrices {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_close(&self, security_id: &Symbol, _asof_date: NaiveDate) -> Result<PriceQuote, ProviderError> {
            Ok(PriceQuote {
                security_id: security_id.clone(),
                close: self.close,
                currency: "USD".to_string(),
            })
        }
    }

    struct AlwaysFails {
        name: &'static str,
    }

    #[async_trait]
    impl PriceProvider for AlwaysFails {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_close(&self, security_id: &Symbol, _asof_date: NaiveDate) -> Result<PriceQuote, ProviderError> {
            Err(ProviderError::NotFound {
                provider: self.name.to_string(),
                key: security_id.to_string(),
            })
        }
    }

    struct FixedFx {
        rate: rust_decimal::Decimal,
    }

    #[async_trait]
    impl FxProvider for FixedFx {
        fn name(&self) -> &str {
            "fixed-fx"
        }

        async fn fetch_rate(&self, base_ccy: &str, quote_ccy: &str, _asof_date: NaiveDate) -> Result<FxQuote, ProviderError> {
            Ok(FxQuote {
                base_ccy: base_ccy.to_string(),
                quote_ccy: quote_ccy.to_string(),
                rate: self.rate,
            })
        }
    }

    fn breaker() -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new("test", CircuitBreakerConfig::default()))
    }

    fn limiter() -> Arc<TokenBucket> {
        Arc::new(TokenBucket::new(1000, 1000))
    }

    #[tokio::test]
    async fn build_falls_back_to_secondary_when_primary_fails() {
        let builder = PricingPackBuilder::new(
            Arc::new(AlwaysFails { name: "primary" }),
            breaker(),
            limiter(),
            Arc::new(AlwaysPrices {
                name: "secondary",
                close: dec!(100.0),
            }),
            breaker(),
            limiter(),
            Arc::new(FixedFx { rate: dec!(1.08) }),
            breaker(),
            limiter(),
            Arc::new(InMemoryPersistence::new()),
        );

        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let pack_id = builder
            .build(date, "last_close_before_cutoff", &[Symbol::new("AAPL")], &[], None)
            .await
            .unwrap();
        assert!(!pack_id.as_str().is_empty());
    }

    #[tokio::test]
    async fn build_is_idempotent_without_a_reason() {
        let store = Arc::new(InMemoryPersistence::new());
        let builder = PricingPackBuilder::new(
            Arc::new(AlwaysPrices {
                name: "primary",
                close: dec!(100.0),
            }),
            breaker(),
            limiter(),
            Arc::new(AlwaysFails { name: "secondary" }),
            breaker(),
            limiter(),
            Arc::new(FixedFx { rate: dec!(1.08) }),
            breaker(),
            limiter(),
            store.clone(),
        );

        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let securities = [Symbol::new("AAPL")];
        let first = builder.build(date, "p", &securities, &[], None).await.unwrap();
        store.mark_fresh(&first).await.unwrap();
        let second = builder.build(date, "p", &securities, &[], None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn total_outage_on_prices_fails_the_whole_build() {
        let builder = PricingPackBuilder::new(
            Arc::new(AlwaysFails { name: "primary" }),
            breaker(),
            limiter(),
            Arc::new(AlwaysFails { name: "secondary" }),
            breaker(),
            limiter(),
            Arc::new(FixedFx { rate: dec!(1.08) }),
            breaker(),
            limiter(),
            Arc::new(InMemoryPersistence::new()),
        );

        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let result = builder.build(date, "p", &[Symbol::new("AAPL")], &[], None).await;
        assert!(matches!(result, Err(BuilderError::PriceProviderOutage { .. })));
    }
}
