//! S4. Pricing pack restatement: rebuilding `(asof_date, policy)` with a
//! `reason` chains the new pack in as the supersede of the old one rather
//! than silently returning the cached pack.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use truth_spine_core::{
    FxProvider, FxQuote, InMemoryPersistence, PriceProvider, PriceQuote, PricingPackBuilder,
    PricingPackRepository, ProviderError, Symbol,
};

use truth_spine_core::resilience::{CircuitBreaker, CircuitBreakerConfig, TokenBucket};

struct FixedPriceProvider {
    close: Decimal,
}

#[async_trait]
impl PriceProvider for FixedPriceProvider {
    fn name(&self) -> &str {
        "polygon"
    }

    async fn fetch_close(&self, security_id: &Symbol, _asof_date: NaiveDate) -> Result<PriceQuote, ProviderError> {
        Ok(PriceQuote { security_id: security_id.clone(), close: self.close, currency: "USD".to_string() })
    }
}

struct NoSecondary;

#[async_trait]
impl PriceProvider for NoSecondary {
    fn name(&self) -> &str {
        "fmp"
    }

    async fn fetch_close(&self, security_id: &Symbol, _asof_date: NaiveDate) -> Result<PriceQuote, ProviderError> {
        Ok(PriceQuote { security_id: security_id.clone(), close: Decimal::ZERO, currency: "USD".to_string() })
    }
}

struct FixedFxProvider;

#[async_trait]
impl FxProvider for FixedFxProvider {
    fn name(&self) -> &str {
        "fred"
    }

    async fn fetch_rate(&self, base_ccy: &str, quote_ccy: &str, _asof_date: NaiveDate) -> Result<FxQuote, ProviderError> {
        Ok(FxQuote { base_ccy: base_ccy.to_string(), quote_ccy: quote_ccy.to_string(), rate: dec!(1.0) })
    }
}

fn breaker() -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::new("test", CircuitBreakerConfig::default()))
}

fn limiter() -> Arc<TokenBucket> {
    Arc::new(TokenBucket::new(1000, 1000))
}

fn builder(close: Decimal, repo: Arc<InMemoryPersistence>) -> PricingPackBuilder {
    PricingPackBuilder::new(
        Arc::new(FixedPriceProvider { close }),
        breaker(),
        limiter(),
        Arc::new(NoSecondary),
        breaker(),
        limiter(),
        Arc::new(FixedFxProvider),
        breaker(),
        limiter(),
        repo,
    )
}

#[tokio::test]
async fn s4_restating_a_fresh_pack_chains_a_distinct_superseding_pack() {
    let repo = Arc::new(InMemoryPersistence::new());
    let asof_date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
    let policy = "last_close_before_cutoff";
    let securities = vec![Symbol::new("AAPL")];

    let original_id = builder(dec!(190.00), repo.clone())
        .build(asof_date, policy, &securities, &[], None)
        .await
        .unwrap();
    repo.mark_fresh(&original_id).await.unwrap();

    let original = repo.get(&original_id).await.unwrap().unwrap();
    assert!(original.is_fresh_and_current());

    // Calling build again without a reason is idempotent: same pack back.
    let replay_id = builder(dec!(999.00), repo.clone())
        .build(asof_date, policy, &securities, &[], None)
        .await
        .unwrap();
    assert_eq!(replay_id, original_id);

    // A restatement with a reason and a genuinely different price forces a
    // rebuild and chains the supersede.
    let restated_id = builder(dec!(191.50), repo.clone())
        .build(asof_date, policy, &securities, &[], Some("vendor correction: AAPL close restated"))
        .await
        .unwrap();
    assert_ne!(restated_id, original_id);

    let original_after = repo.get(&original_id).await.unwrap().unwrap();
    assert_eq!(original_after.superseded_by, Some(restated_id.clone()));
    assert!(!original_after.is_fresh_and_current());

    let restated = repo.get(&restated_id).await.unwrap().unwrap();
    assert_ne!(restated.hash, original_after.hash);
    assert!(restated.superseded_by.is_none());

    repo.mark_fresh(&restated_id).await.unwrap();
    let current = repo.latest_fresh(asof_date, policy).await.unwrap().unwrap();
    assert_eq!(current.id, restated_id);

    let latest_any = repo.latest_any(asof_date, policy).await.unwrap().unwrap();
    assert_eq!(latest_any.id, restated_id);
}
