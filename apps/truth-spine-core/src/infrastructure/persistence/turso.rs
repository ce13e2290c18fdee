//! Turso-backed implementation of the persistence ports.
//!
//! Turso is the Rust rewrite of `SQLite`; all amounts are stored as
//! canonical decimal strings and parsed back on read so no precision is
//! lost to floating point round-tripping.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;
use turso::{Builder, Database, Row, Value};

use async_trait::async_trait;

use super::repository::{AlertRepository, MetricsRepository, PersistenceError, PricingPackRepository};
use crate::domain::alerting::{Alert, Condition, DeliveryChannel, DlqJob, DlqStatus, Notification};
use crate::domain::metrics::{CurrencyAttribution, PortfolioDailyValue, PortfolioMetrics};
use crate::domain::pricing_pack::{FxRate, Pack, PackStatus, Price, SourcesManifest};
use crate::domain::shared::{AlertId, NotificationId, PackId, PortfolioId, Symbol};

impl From<turso::Error> for PersistenceError {
    fn from(err: turso::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Turso-backed repository implementing all three persistence ports against
/// one underlying database.
pub struct TursoPersistence {
    db: Database,
}

impl TursoPersistence {
    /// Open (or create) a local database file and run migrations.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the database cannot be opened or the
    /// migration statements fail.
    pub async fn new_local(path: &str) -> Result<Self, PersistenceError> {
        let db = Builder::new_local(path).build().await?;
        Self::migrate(&db).await?;
        Ok(Self { db })
    }

    /// An in-memory Turso database, for integration tests that want real SQL
    /// semantics without a file on disk.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if migrations fail.
    pub async fn new_in_memory() -> Result<Self, PersistenceError> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::migrate(&db).await?;
        Ok(Self { db })
    }

    async fn migrate(db: &Database) -> Result<(), PersistenceError> {
        let conn = db.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pricing_packs (
                id TEXT PRIMARY KEY,
                asof_date TEXT NOT NULL,
                policy TEXT NOT NULL,
                hash TEXT NOT NULL,
                status TEXT NOT NULL,
                prewarm_done INTEGER NOT NULL DEFAULT 0,
                superseded_by TEXT,
                sources_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_packs_date_policy ON pricing_packs(asof_date, policy);

            CREATE TABLE IF NOT EXISTS pack_prices (
                pricing_pack_id TEXT NOT NULL,
                security_id TEXT NOT NULL,
                close TEXT NOT NULL,
                currency TEXT NOT NULL,
                source TEXT NOT NULL,
                PRIMARY KEY (pricing_pack_id, security_id)
            );

            CREATE TABLE IF NOT EXISTS pack_fx_rates (
                pricing_pack_id TEXT NOT NULL,
                base_ccy TEXT NOT NULL,
                quote_ccy TEXT NOT NULL,
                rate TEXT NOT NULL,
                source TEXT NOT NULL,
                PRIMARY KEY (pricing_pack_id, base_ccy, quote_ccy)
            );

            CREATE TABLE IF NOT EXISTS portfolio_daily_values (
                portfolio_id TEXT NOT NULL,
                asof_date TEXT NOT NULL,
                pricing_pack_id TEXT NOT NULL,
                market_value_base_ccy TEXT NOT NULL,
                daily_return TEXT NOT NULL,
                PRIMARY KEY (portfolio_id, asof_date)
            );

            CREATE TABLE IF NOT EXISTS portfolio_metrics (
                portfolio_id TEXT NOT NULL,
                asof_date TEXT NOT NULL,
                pricing_pack_id TEXT NOT NULL,
                metrics_json TEXT NOT NULL,
                PRIMARY KEY (portfolio_id, asof_date)
            );

            CREATE TABLE IF NOT EXISTS currency_attribution (
                portfolio_id TEXT NOT NULL,
                asof_date TEXT NOT NULL,
                security_id TEXT NOT NULL DEFAULT '',
                attribution_json TEXT NOT NULL,
                PRIMARY KEY (portfolio_id, asof_date, security_id)
            );

            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                condition_json TEXT NOT NULL,
                channels_json TEXT NOT NULL,
                cooldown_hours INTEGER NOT NULL,
                last_fired_at TEXT,
                is_active INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                alert_id TEXT NOT NULL,
                day_of_delivery TEXT NOT NULL,
                channel TEXT NOT NULL,
                message TEXT NOT NULL,
                delivered_at TEXT NOT NULL,
                UNIQUE (user_id, alert_id, day_of_delivery)
            );

            CREATE TABLE IF NOT EXISTS dlq_jobs (
                id TEXT PRIMARY KEY,
                alert_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                error TEXT NOT NULL,
                retry_count INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_attempted_at TEXT
            );",
        )
        .await?;
        debug!("truth spine migrations complete");
        Ok(())
    }

    fn row_text(row: &Row, idx: usize, field: &str) -> Result<String, PersistenceError> {
        row.get::<String>(idx)
            .map_err(|e| PersistenceError::Storage(format!("{field}: {e}")))
    }

    fn row_decimal(row: &Row, idx: usize, field: &str) -> Result<Decimal, PersistenceError> {
        let raw = Self::row_text(row, idx, field)?;
        Decimal::from_str(&raw).map_err(|e| PersistenceError::Storage(format!("{field}: {e}")))
    }

    fn row_to_pack(row: &Row) -> Result<Pack, PersistenceError> {
        let status = match Self::row_text(row, 4, "status")?.as_str() {
            "fresh" => PackStatus::Fresh,
            "error" => PackStatus::Error,
            _ => PackStatus::Warming,
        };
        let sources: SourcesManifest =
            serde_json::from_str(&Self::row_text(row, 7, "sources_json")?)
                .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(Pack {
            id: PackId::new(Self::row_text(row, 0, "id")?),
            asof_date: NaiveDate::parse_from_str(&Self::row_text(row, 1, "asof_date")?, "%Y-%m-%d")
                .map_err(|e| PersistenceError::Storage(e.to_string()))?,
            policy: Self::row_text(row, 2, "policy")?,
            hash: Self::row_text(row, 3, "hash")?,
            status,
            prewarm_done: row.get::<i64>(5).unwrap_or(0) != 0,
            superseded_by: row.get::<String>(6).ok().map(PackId::new),
            sources,
            created_at: Self::row_text(row, 8, "created_at")?
                .parse::<DateTime<Utc>>()
                .map_err(|e| PersistenceError::Storage(e.to_string()))?,
            updated_at: Self::row_text(row, 9, "updated_at")?
                .parse::<DateTime<Utc>>()
                .map_err(|e| PersistenceError::Storage(e.to_string()))?,
        })
    }
}

#[async_trait]
impl PricingPackRepository for TursoPersistence {
    async fn insert_pack(
        &self,
        pack: Pack,
        prices: Vec<Price>,
        rates: Vec<FxRate>,
    ) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        let sources_json = serde_json::to_string(&pack.sources).map_err(|e| PersistenceError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO pricing_packs (id, asof_date, policy, hash, status, prewarm_done, superseded_by, sources_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                Value::Text(pack.id.as_str().to_string()),
                Value::Text(pack.asof_date.to_string()),
                Value::Text(pack.policy.clone()),
                Value::Text(pack.hash.clone()),
                Value::Text(match pack.status {
                    PackStatus::Warming => "warming",
                    PackStatus::Fresh => "fresh",
                    PackStatus::Error => "error",
                }.to_string()),
                Value::Integer(i64::from(pack.prewarm_done)),
                pack.superseded_by.map(|p| Value::Text(p.as_str().to_string())).unwrap_or(Value::Null),
                Value::Text(sources_json),
                Value::Text(pack.created_at.to_rfc3339()),
                Value::Text(pack.updated_at.to_rfc3339()),
            ],
        )
        .await?;

        for price in &prices {
            conn.execute(
                "INSERT INTO pack_prices (pricing_pack_id, security_id, close, currency, source) VALUES (?, ?, ?, ?, ?)",
                vec![
                    Value::Text(price.pricing_pack_id.as_str().to_string()),
                    Value::Text(price.security_id.as_str().to_string()),
                    Value::Text(price.close.to_string()),
                    Value::Text(price.currency.clone()),
                    Value::Text(price.source.clone()),
                ],
            )
            .await?;
        }

        for rate in &rates {
            conn.execute(
                "INSERT INTO pack_fx_rates (pricing_pack_id, base_ccy, quote_ccy, rate, source) VALUES (?, ?, ?, ?, ?)",
                vec![
                    Value::Text(rate.pricing_pack_id.as_str().to_string()),
                    Value::Text(rate.base_ccy.clone()),
                    Value::Text(rate.quote_ccy.clone()),
                    Value::Text(rate.rate.to_string()),
                    Value::Text(rate.source.clone()),
                ],
            )
            .await?;
        }
        Ok(())
    }

    async fn mark_fresh(&self, pack_id: &PackId) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        conn.execute(
            "UPDATE pricing_packs SET status = 'fresh', updated_at = ? WHERE id = ?",
            vec![Value::Text(Utc::now().to_rfc3339()), Value::Text(pack_id.as_str().to_string())],
        )
        .await?;
        Ok(())
    }

    async fn supersede(&self, old: &PackId, new: &PackId) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        conn.execute(
            "UPDATE pricing_packs SET superseded_by = ?, updated_at = ? WHERE id = ?",
            vec![
                Value::Text(new.as_str().to_string()),
                Value::Text(Utc::now().to_rfc3339()),
                Value::Text(old.as_str().to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn mark_prewarmed(&self, pack_id: &PackId) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        conn.execute(
            "UPDATE pricing_packs SET prewarm_done = 1 WHERE id = ?",
            vec![Value::Text(pack_id.as_str().to_string())],
        )
        .await?;
        Ok(())
    }

    async fn latest_fresh(
        &self,
        asof_date: NaiveDate,
        policy: &str,
    ) -> Result<Option<Pack>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, asof_date, policy, hash, status, prewarm_done, superseded_by, sources_json, created_at, updated_at
                 FROM pricing_packs
                 WHERE asof_date = ? AND policy = ? AND status = 'fresh' AND superseded_by IS NULL
                 ORDER BY updated_at DESC LIMIT 1",
                vec![Value::Text(asof_date.to_string()), Value::Text(policy.to_string())],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_pack(&row)?)),
            None => Ok(None),
        }
    }

    async fn latest_any(
        &self,
        asof_date: NaiveDate,
        policy: &str,
    ) -> Result<Option<Pack>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, asof_date, policy, hash, status, prewarm_done, superseded_by, sources_json, created_at, updated_at
                 FROM pricing_packs
                 WHERE asof_date = ? AND policy = ?
                 ORDER BY updated_at DESC LIMIT 1",
                vec![Value::Text(asof_date.to_string()), Value::Text(policy.to_string())],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_pack(&row)?)),
            None => Ok(None),
        }
    }

    async fn get(&self, pack_id: &PackId) -> Result<Option<Pack>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, asof_date, policy, hash, status, prewarm_done, superseded_by, sources_json, created_at, updated_at
                 FROM pricing_packs WHERE id = ?",
                vec![Value::Text(pack_id.as_str().to_string())],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_pack(&row)?)),
            None => Ok(None),
        }
    }

    async fn prices_for(&self, pack_id: &PackId) -> Result<Vec<Price>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT security_id, close, currency, source FROM pack_prices WHERE pricing_pack_id = ?",
                vec![Value::Text(pack_id.as_str().to_string())],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Price {
                security_id: Symbol::new(Self::row_text(&row, 0, "security_id")?),
                pricing_pack_id: pack_id.clone(),
                close: Self::row_decimal(&row, 1, "close")?,
                currency: Self::row_text(&row, 2, "currency")?,
                source: Self::row_text(&row, 3, "source")?,
            });
        }
        Ok(out)
    }

    async fn fx_rates_for(&self, pack_id: &PackId) -> Result<Vec<FxRate>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT base_ccy, quote_ccy, rate, source FROM pack_fx_rates WHERE pricing_pack_id = ?",
                vec![Value::Text(pack_id.as_str().to_string())],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(FxRate {
                base_ccy: Self::row_text(&row, 0, "base_ccy")?,
                quote_ccy: Self::row_text(&row, 1, "quote_ccy")?,
                pricing_pack_id: pack_id.clone(),
                rate: Self::row_decimal(&row, 2, "rate")?,
                source: Self::row_text(&row, 3, "source")?,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl MetricsRepository for TursoPersistence {
    async fn upsert_daily_value(&self, row: PortfolioDailyValue) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO portfolio_daily_values (portfolio_id, asof_date, pricing_pack_id, market_value_base_ccy, daily_return)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (portfolio_id, asof_date) DO UPDATE SET
                pricing_pack_id = excluded.pricing_pack_id,
                market_value_base_ccy = excluded.market_value_base_ccy,
                daily_return = excluded.daily_return",
            vec![
                Value::Text(row.portfolio_id.as_str().to_string()),
                Value::Text(row.asof_date.to_string()),
                Value::Text(row.pricing_pack_id.as_str().to_string()),
                Value::Text(row.market_value_base_ccy.to_string()),
                Value::Text(row.daily_return.to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_metrics(&self, row: PortfolioMetrics) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        let json = serde_json::to_string(&row).map_err(|e| PersistenceError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO portfolio_metrics (portfolio_id, asof_date, pricing_pack_id, metrics_json)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (portfolio_id, asof_date) DO UPDATE SET
                pricing_pack_id = excluded.pricing_pack_id, metrics_json = excluded.metrics_json",
            vec![
                Value::Text(row.portfolio_id.as_str().to_string()),
                Value::Text(row.asof_date.to_string()),
                Value::Text(row.pricing_pack_id.as_str().to_string()),
                Value::Text(json),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_attribution(&self, row: CurrencyAttribution) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        let sec = row.security_id.as_ref().map_or(String::new(), |s| s.as_str().to_string());
        let json = serde_json::to_string(&row).map_err(|e| PersistenceError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO currency_attribution (portfolio_id, asof_date, security_id, attribution_json)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (portfolio_id, asof_date, security_id) DO UPDATE SET attribution_json = excluded.attribution_json",
            vec![
                Value::Text(row.portfolio_id.as_str().to_string()),
                Value::Text(row.asof_date.to_string()),
                Value::Text(sec),
                Value::Text(json),
            ],
        )
        .await?;
        Ok(())
    }

    async fn daily_values_since(
        &self,
        portfolio_id: &PortfolioId,
        since: NaiveDate,
    ) -> Result<Vec<PortfolioDailyValue>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT pricing_pack_id, asof_date, market_value_base_ccy, daily_return
                 FROM portfolio_daily_values WHERE portfolio_id = ? AND asof_date >= ? ORDER BY asof_date ASC",
                vec![Value::Text(portfolio_id.as_str().to_string()), Value::Text(since.to_string())],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(PortfolioDailyValue {
                portfolio_id: portfolio_id.clone(),
                pricing_pack_id: PackId::new(Self::row_text(&row, 0, "pricing_pack_id")?),
                asof_date: NaiveDate::parse_from_str(&Self::row_text(&row, 1, "asof_date")?, "%Y-%m-%d")
                    .map_err(|e| PersistenceError::Storage(e.to_string()))?,
                market_value_base_ccy: Self::row_decimal(&row, 2, "market_value_base_ccy")?,
                daily_return: Self::row_decimal(&row, 3, "daily_return")?,
            });
        }
        Ok(out)
    }

    async fn latest_metrics(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Option<PortfolioMetrics>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT metrics_json FROM portfolio_metrics WHERE portfolio_id = ? ORDER BY asof_date DESC LIMIT 1",
                vec![Value::Text(portfolio_id.as_str().to_string())],
            )
            .await?;
        match rows.next().await? {
            Some(row) => {
                let json = Self::row_text(&row, 0, "metrics_json")?;
                Ok(Some(serde_json::from_str(&json).map_err(|e| PersistenceError::Storage(e.to_string()))?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AlertRepository for TursoPersistence {
    async fn active_alerts(&self) -> Result<Vec<Alert>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, condition_json, channels_json, cooldown_hours, last_fired_at
                 FROM alerts WHERE is_active = 1",
                vec![],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let condition: Condition = serde_json::from_str(&Self::row_text(&row, 2, "condition_json")?)
                .map_err(|e| PersistenceError::Storage(e.to_string()))?;
            let channels: Vec<DeliveryChannel> = serde_json::from_str(&Self::row_text(&row, 3, "channels_json")?)
                .map_err(|e| PersistenceError::Storage(e.to_string()))?;
            out.push(Alert {
                id: AlertId::new(Self::row_text(&row, 0, "id")?),
                user_id: Self::row_text(&row, 1, "user_id")?,
                condition,
                channels,
                cooldown_hours: row.get::<i64>(4).unwrap_or(24),
                last_fired_at: row
                    .get::<String>(5)
                    .ok()
                    .and_then(|s| s.parse::<DateTime<Utc>>().ok()),
                is_active: true,
            });
        }
        Ok(out)
    }

    async fn record_fire(&self, alert_id: &AlertId, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        conn.execute(
            "UPDATE alerts SET last_fired_at = ? WHERE id = ?",
            vec![Value::Text(at.to_rfc3339()), Value::Text(alert_id.as_str().to_string())],
        )
        .await?;
        Ok(())
    }

    async fn insert_notification(&self, notification: Notification) -> Result<bool, PersistenceError> {
        let conn = self.db.connect()?;
        let result = conn
            .execute(
                "INSERT OR IGNORE INTO notifications (id, user_id, alert_id, day_of_delivery, channel, message, delivered_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                vec![
                    Value::Text(notification.id.as_str().to_string()),
                    Value::Text(notification.user_id.clone()),
                    Value::Text(notification.alert_id.as_str().to_string()),
                    Value::Text(notification.day_of_delivery.to_string()),
                    Value::Text(match notification.channel {
                        DeliveryChannel::InApp => "in_app",
                        DeliveryChannel::Email => "email",
                    }.to_string()),
                    Value::Text(notification.message.clone()),
                    Value::Text(notification.delivered_at.to_rfc3339()),
                ],
            )
            .await?;
        Ok(result > 0)
    }

    async fn enqueue_dlq(&self, job: DlqJob) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO dlq_jobs (id, alert_id, payload, error, retry_count, status, created_at, last_attempted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                Value::Text(job.id.as_str().to_string()),
                Value::Text(job.alert_id.as_str().to_string()),
                Value::Text(job.payload.clone()),
                Value::Text(job.error.clone()),
                Value::Integer(i64::from(job.retry_count)),
                Value::Text(dlq_status_str(job.status).to_string()),
                Value::Text(job.created_at.to_rfc3339()),
                job.last_attempted_at.map(|t| Value::Text(t.to_rfc3339())).unwrap_or(Value::Null),
            ],
        )
        .await?;
        Ok(())
    }

    async fn due_dlq_jobs(&self, now: DateTime<Utc>) -> Result<Vec<DlqJob>, PersistenceError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, alert_id, payload, error, retry_count, status, created_at, last_attempted_at
                 FROM dlq_jobs WHERE status = 'pending'",
                vec![],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let job = DlqJob {
                id: crate::domain::shared::DlqJobId::new(Self::row_text(&row, 0, "id")?),
                alert_id: AlertId::new(Self::row_text(&row, 1, "alert_id")?),
                payload: Self::row_text(&row, 2, "payload")?,
                error: Self::row_text(&row, 3, "error")?,
                retry_count: u32::try_from(row.get::<i64>(4).unwrap_or(0)).unwrap_or(0),
                status: DlqStatus::Pending,
                created_at: Self::row_text(&row, 6, "created_at")?
                    .parse()
                    .map_err(|e: chrono::ParseError| PersistenceError::Storage(e.to_string()))?,
                last_attempted_at: row.get::<String>(7).ok().and_then(|s| s.parse().ok()),
            };
            if job.is_due(now) {
                out.push(job);
            }
        }
        Ok(out)
    }

    async fn update_dlq(&self, job: DlqJob) -> Result<(), PersistenceError> {
        let conn = self.db.connect()?;
        conn.execute(
            "UPDATE dlq_jobs SET retry_count = ?, status = ?, error = ?, last_attempted_at = ? WHERE id = ?",
            vec![
                Value::Integer(i64::from(job.retry_count)),
                Value::Text(dlq_status_str(job.status).to_string()),
                Value::Text(job.error.clone()),
                job.last_attempted_at.map(|t| Value::Text(t.to_rfc3339())).unwrap_or(Value::Null),
                Value::Text(job.id.as_str().to_string()),
            ],
        )
        .await?;
        Ok(())
    }
}

fn dlq_status_str(status: DlqStatus) -> &'static str {
    match status {
        DlqStatus::Pending => "pending",
        DlqStatus::Delivered => "delivered",
        DlqStatus::Failed => "failed",
    }
}
