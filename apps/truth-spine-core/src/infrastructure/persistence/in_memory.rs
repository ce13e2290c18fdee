//! In-memory adapter for the persistence ports, used by tests and local
//! development without a Turso database.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::repository::{AlertRepository, MetricsRepository, PersistenceError, PricingPackRepository};
use crate::domain::alerting::{Alert, DlqJob, DlqStatus, Notification};
use crate::domain::metrics::{CurrencyAttribution, PortfolioDailyValue, PortfolioMetrics};
use crate::domain::pricing_pack::{FxRate, Pack, PackStatus, Price};
use crate::domain::shared::{AlertId, PackId, PortfolioId};

#[derive(Default)]
struct Store {
    packs: HashMap<String, Pack>,
    prices: HashMap<String, Vec<Price>>,
    fx_rates: HashMap<String, Vec<FxRate>>,
    daily_values: HashMap<String, Vec<PortfolioDailyValue>>,
    metrics: HashMap<String, PortfolioMetrics>,
    attribution: HashMap<String, CurrencyAttribution>,
    alerts: HashMap<String, Alert>,
    notifications: HashMap<(String, String, NaiveDate), Notification>,
    dlq: HashMap<String, DlqJob>,
}

/// A single in-process store backing all three repository traits.
///
/// Not for production use — state is lost on restart and there is no
/// cross-process locking.
#[derive(Default)]
pub struct InMemoryPersistence {
    store: RwLock<Store>,
}

impl InMemoryPersistence {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an active alert (test setup helper).
    pub fn add_alert(&self, alert: Alert) {
        self.store.write().unwrap().alerts.insert(alert.id.as_str().to_string(), alert);
    }
}

#[async_trait]
impl PricingPackRepository for InMemoryPersistence {
    async fn insert_pack(
        &self,
        pack: Pack,
        prices: Vec<Price>,
        rates: Vec<FxRate>,
    ) -> Result<(), PersistenceError> {
        let mut store = self.store.write().unwrap();
        let key = pack.id.as_str().to_string();
        store.prices.insert(key.clone(), prices);
        store.fx_rates.insert(key.clone(), rates);
        store.packs.insert(key, pack);
        Ok(())
    }

    async fn mark_fresh(&self, pack_id: &PackId) -> Result<(), PersistenceError> {
        let mut store = self.store.write().unwrap();
        let pack = store
            .packs
            .get_mut(pack_id.as_str())
            .ok_or_else(|| PersistenceError::NotFound(pack_id.as_str().to_string()))?;
        pack.status = PackStatus::Fresh;
        pack.updated_at = Utc::now();
        Ok(())
    }

    async fn supersede(&self, old: &PackId, new: &PackId) -> Result<(), PersistenceError> {
        let mut store = self.store.write().unwrap();
        let pack = store
            .packs
            .get_mut(old.as_str())
            .ok_or_else(|| PersistenceError::NotFound(old.as_str().to_string()))?;
        pack.superseded_by = Some(new.clone());
        pack.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_prewarmed(&self, pack_id: &PackId) -> Result<(), PersistenceError> {
        let mut store = self.store.write().unwrap();
        let pack = store
            .packs
            .get_mut(pack_id.as_str())
            .ok_or_else(|| PersistenceError::NotFound(pack_id.as_str().to_string()))?;
        pack.prewarm_done = true;
        Ok(())
    }

    async fn latest_fresh(
        &self,
        asof_date: NaiveDate,
        policy: &str,
    ) -> Result<Option<Pack>, PersistenceError> {
        let store = self.store.read().unwrap();
        Ok(store
            .packs
            .values()
            .filter(|p| p.asof_date == asof_date && p.policy == policy && p.is_fresh_and_current())
            .max_by_key(|p| p.updated_at)
            .cloned())
    }

    async fn latest_any(
        &self,
        asof_date: NaiveDate,
        policy: &str,
    ) -> Result<Option<Pack>, PersistenceError> {
        let store = self.store.read().unwrap();
        Ok(store
            .packs
            .values()
            .filter(|p| p.asof_date == asof_date && p.policy == policy)
            .max_by_key(|p| p.updated_at)
            .cloned())
    }

    async fn get(&self, pack_id: &PackId) -> Result<Option<Pack>, PersistenceError> {
        Ok(self.store.read().unwrap().packs.get(pack_id.as_str()).cloned())
    }

    async fn prices_for(&self, pack_id: &PackId) -> Result<Vec<Price>, PersistenceError> {
        Ok(self.store.read().unwrap().prices.get(pack_id.as_str()).cloned().unwrap_or_default())
    }

    async fn fx_rates_for(&self, pack_id: &PackId) -> Result<Vec<FxRate>, PersistenceError> {
        Ok(self.store.read().unwrap().fx_rates.get(pack_id.as_str()).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MetricsRepository for InMemoryPersistence {
    async fn upsert_daily_value(&self, row: PortfolioDailyValue) -> Result<(), PersistenceError> {
        let mut store = self.store.write().unwrap();
        let series = store.daily_values.entry(row.portfolio_id.as_str().to_string()).or_default();
        if let Some(existing) = series.iter_mut().find(|r| r.asof_date == row.asof_date) {
            *existing = row;
        } else {
            series.push(row);
        }
        Ok(())
    }

    async fn upsert_metrics(&self, row: PortfolioMetrics) -> Result<(), PersistenceError> {
        let key = format!("{}:{}", row.portfolio_id.as_str(), row.asof_date);
        self.store.write().unwrap().metrics.insert(key, row);
        Ok(())
    }

    async fn upsert_attribution(&self, row: CurrencyAttribution) -> Result<(), PersistenceError> {
        let sec = row.security_id.as_ref().map_or("__portfolio__", |s| s.as_str()).to_string();
        let key = format!("{}:{}:{}", row.portfolio_id.as_str(), row.asof_date, sec);
        self.store.write().unwrap().attribution.insert(key, row);
        Ok(())
    }

    async fn daily_values_since(
        &self,
        portfolio_id: &PortfolioId,
        since: NaiveDate,
    ) -> Result<Vec<PortfolioDailyValue>, PersistenceError> {
        let store = self.store.read().unwrap();
        let mut rows: Vec<PortfolioDailyValue> = store
            .daily_values
            .get(portfolio_id.as_str())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.asof_date >= since)
            .collect();
        rows.sort_by_key(|r| r.asof_date);
        Ok(rows)
    }

    async fn latest_metrics(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Option<PortfolioMetrics>, PersistenceError> {
        let store = self.store.read().unwrap();
        Ok(store
            .metrics
            .values()
            .filter(|m| m.portfolio_id == *portfolio_id)
            .max_by_key(|m| m.asof_date)
            .cloned())
    }
}

#[async_trait]
impl AlertRepository for InMemoryPersistence {
    async fn active_alerts(&self) -> Result<Vec<Alert>, PersistenceError> {
        Ok(self.store.read().unwrap().alerts.values().filter(|a| a.is_active).cloned().collect())
    }

    async fn record_fire(&self, alert_id: &AlertId, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        let mut store = self.store.write().unwrap();
        let alert = store
            .alerts
            .get_mut(alert_id.as_str())
            .ok_or_else(|| PersistenceError::NotFound(alert_id.as_str().to_string()))?;
        alert.last_fired_at = Some(at);
        Ok(())
    }

    async fn insert_notification(&self, notification: Notification) -> Result<bool, PersistenceError> {
        let mut store = self.store.write().unwrap();
        let (user, alert, day) = notification.dedup_key();
        let key = (user, alert.as_str().to_string(), day);
        if store.notifications.contains_key(&key) {
            return Ok(false);
        }
        store.notifications.insert(key, notification);
        Ok(true)
    }

    async fn enqueue_dlq(&self, job: DlqJob) -> Result<(), PersistenceError> {
        self.store.write().unwrap().dlq.insert(job.id.as_str().to_string(), job);
        Ok(())
    }

    async fn due_dlq_jobs(&self, now: DateTime<Utc>) -> Result<Vec<DlqJob>, PersistenceError> {
        Ok(self
            .store
            .read()
            .unwrap()
            .dlq
            .values()
            .filter(|j| j.status == DlqStatus::Pending && j.is_due(now))
            .cloned()
            .collect())
    }

    async fn update_dlq(&self, job: DlqJob) -> Result<(), PersistenceError> {
        self.store.write().unwrap().dlq.insert(job.id.as_str().to_string(), job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alerting::{ComparisonOperator, Condition, DeliveryChannel};
    use chrono::TimeZone;

    fn sample_pack(status: PackStatus) -> Pack {
        let now = Utc.with_ymd_and_hms(2026, 7, 27, 0, 5, 0).unwrap();
        Pack {
            id: PackId::new("pack-1"),
            asof_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            policy: "4pm_fixing_usd".to_string(),
            hash: "deadbeef".to_string(),
            status,
            prewarm_done: false,
            superseded_by: None,
            sources: Default::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_then_mark_fresh_makes_pack_servable() {
        let repo = InMemoryPersistence::new();
        repo.insert_pack(sample_pack(PackStatus::Warming), vec![], vec![]).await.unwrap();
        assert!(repo
            .latest_fresh(NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(), "4pm_fixing_usd")
            .await
            .unwrap()
            .is_none());

        repo.mark_fresh(&PackId::new("pack-1")).await.unwrap();
        let fresh = repo
            .latest_fresh(NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(), "4pm_fixing_usd")
            .await
            .unwrap();
        assert!(fresh.is_some());
    }

    #[tokio::test]
    async fn superseded_pack_is_not_latest_fresh() {
        let repo = InMemoryPersistence::new();
        repo.insert_pack(sample_pack(PackStatus::Fresh), vec![], vec![]).await.unwrap();
        repo.supersede(&PackId::new("pack-1"), &PackId::new("pack-2")).await.unwrap();
        assert!(repo
            .latest_fresh(NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(), "4pm_fixing_usd")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn notification_dedup_rejects_same_day_repeat() {
        let repo = InMemoryPersistence::new();
        let n = Notification {
            id: crate::domain::shared::NotificationId::new("n1"),
            user_id: "user-1".to_string(),
            alert_id: AlertId::new("alert-1"),
            day_of_delivery: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            channel: DeliveryChannel::InApp,
            message: "AAPL crossed $200".to_string(),
            delivered_at: Utc::now(),
        };
        assert!(repo.insert_notification(n.clone()).await.unwrap());
        let dup = Notification {
            id: crate::domain::shared::NotificationId::new("n2"),
            channel: DeliveryChannel::Email,
            ..n
        };
        assert!(!repo.insert_notification(dup).await.unwrap());
    }

    #[tokio::test]
    async fn active_alerts_excludes_inactive() {
        let repo = InMemoryPersistence::new();
        repo.add_alert(Alert {
            id: AlertId::new("alert-1"),
            user_id: "user-1".to_string(),
            condition: Condition::Price {
                security_id: "AAPL".to_string(),
                operator: ComparisonOperator::GreaterThan,
                threshold: rust_decimal_macros::dec!(200.0),
            },
            channels: vec![DeliveryChannel::InApp],
            cooldown_hours: 24,
            last_fired_at: None,
            is_active: false,
        });
        assert!(repo.active_alerts().await.unwrap().is_empty());
    }
}
