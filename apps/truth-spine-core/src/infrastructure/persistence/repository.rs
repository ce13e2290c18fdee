//! Repository traits for the three bounded contexts that survive a process
//! restart: pricing packs, portfolio metrics, and alerting.
//!
//! Each trait is implemented once in-memory (`in_memory.rs`, used by tests)
//! and once against Turso (`turso.rs`, used in production).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::domain::alerting::{Alert, DlqJob, Notification};
use crate::domain::metrics::{CurrencyAttribution, PortfolioDailyValue, PortfolioMetrics};
use crate::domain::pricing_pack::{FxRate, Pack, Price};
use crate::domain::shared::{AlertId, PackId, PortfolioId};

/// Errors from a repository adapter.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The underlying store could not be reached or the query failed.
    #[error("storage error: {0}")]
    Storage(String),
    /// A row referenced by id does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Packs, and the price/FX rows owned by them.
#[async_trait]
pub trait PricingPackRepository: Send + Sync {
    /// Insert a newly built pack together with its price and FX rows.
    async fn insert_pack(
        &self,
        pack: Pack,
        prices: Vec<Price>,
        rates: Vec<FxRate>,
    ) -> Result<(), PersistenceError>;

    /// Promote a `warming` pack to `fresh`.
    async fn mark_fresh(&self, pack_id: &PackId) -> Result<(), PersistenceError>;

    /// Record the one-shot supersede pointer from an old pack to its
    /// restatement.
    async fn supersede(&self, old: &PackId, new: &PackId) -> Result<(), PersistenceError>;

    /// Mark the non-blocking pre-warm steps complete for a pack.
    async fn mark_prewarmed(&self, pack_id: &PackId) -> Result<(), PersistenceError>;

    /// The latest non-superseded, fresh pack for `(asof_date, policy)`, if any.
    async fn latest_fresh(
        &self,
        asof_date: NaiveDate,
        policy: &str,
    ) -> Result<Option<Pack>, PersistenceError>;

    /// The latest pack for `(asof_date, policy)` regardless of status, so
    /// the freshness gate can report *why* it is closed (still warming vs.
    /// never built) rather than just "not found".
    async fn latest_any(
        &self,
        asof_date: NaiveDate,
        policy: &str,
    ) -> Result<Option<Pack>, PersistenceError>;

    /// Fetch a pack by id regardless of status.
    async fn get(&self, pack_id: &PackId) -> Result<Option<Pack>, PersistenceError>;

    /// Prices owned by a pack.
    async fn prices_for(&self, pack_id: &PackId) -> Result<Vec<Price>, PersistenceError>;

    /// FX rates owned by a pack.
    async fn fx_rates_for(&self, pack_id: &PackId) -> Result<Vec<FxRate>, PersistenceError>;
}

/// Per-portfolio daily valuations, metrics, and currency attribution rows.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// `UPSERT` a daily valuation row.
    async fn upsert_daily_value(&self, row: PortfolioDailyValue) -> Result<(), PersistenceError>;

    /// `UPSERT` a computed metrics row.
    async fn upsert_metrics(&self, row: PortfolioMetrics) -> Result<(), PersistenceError>;

    /// `UPSERT` a currency attribution row.
    async fn upsert_attribution(&self, row: CurrencyAttribution) -> Result<(), PersistenceError>;

    /// Daily valuations for one portfolio on or after `since`, ordered by date.
    async fn daily_values_since(
        &self,
        portfolio_id: &PortfolioId,
        since: NaiveDate,
    ) -> Result<Vec<PortfolioDailyValue>, PersistenceError>;

    /// The most recently computed metrics row for a portfolio, if any.
    async fn latest_metrics(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Option<PortfolioMetrics>, PersistenceError>;
}

/// Alert rules, delivered notifications, and the dead-letter queue.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// All alerts currently eligible for evaluation.
    async fn active_alerts(&self) -> Result<Vec<Alert>, PersistenceError>;

    /// Record that an alert fired, resetting its cooldown clock.
    async fn record_fire(&self, alert_id: &AlertId, at: DateTime<Utc>) -> Result<(), PersistenceError>;

    /// Insert a notification, honoring the `(user, alert, day)` dedup key.
    /// Returns `false` if a notification with the same key already exists.
    async fn insert_notification(&self, notification: Notification) -> Result<bool, PersistenceError>;

    /// Enqueue a failed delivery for DLQ replay.
    async fn enqueue_dlq(&self, job: DlqJob) -> Result<(), PersistenceError>;

    /// Pending DLQ jobs due for replay as of `now`.
    async fn due_dlq_jobs(&self, now: DateTime<Utc>) -> Result<Vec<DlqJob>, PersistenceError>;

    /// Persist the outcome of a replay attempt.
    async fn update_dlq(&self, job: DlqJob) -> Result<(), PersistenceError>;
}
