//! Default [`ObservedValueSource`] wired in production: reads `metric`
//! conditions from the latest persisted [`PortfolioMetrics`] row.
//!
//! `macro`, `rating`, `price`, and `news_sentiment` conditions have no
//! backing feed in this core yet (no macro series, ratings, or sentiment
//! provider exists) and always read as `None`, which the evaluator treats
//! as "skip, not failed" rather than firing spuriously on absent data.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::evaluator::ObservedValueSource;
use crate::domain::alerting::Condition;
use crate::domain::shared::PortfolioId;
use crate::infrastructure::persistence::MetricsRepository;

/// Reads a named field off the latest `PortfolioMetrics` row for a
/// portfolio. `user_id` is treated as the portfolio id it owns, per the
/// current one-portfolio-per-user deployment shape.
pub struct MetricsObservedValueSource {
    repo: Arc<dyn MetricsRepository>,
}

impl MetricsObservedValueSource {
    #[must_use]
    pub fn new(repo: Arc<dyn MetricsRepository>) -> Self {
        Self { repo }
    }

    fn field(metric_name: &str, metrics: &crate::domain::metrics::PortfolioMetrics) -> Option<Decimal> {
        match metric_name {
            "twr_1d" => metrics.twr_1d,
            "twr_mtd" => metrics.twr_mtd,
            "twr_qtd" => metrics.twr_qtd,
            "twr_ytd" => metrics.twr_ytd,
            "twr_1y" => metrics.twr_1y,
            "volatility_1y" => metrics.volatility_1y,
            "sharpe_1y" => metrics.sharpe_1y,
            "max_drawdown" => metrics.max_drawdown,
            _ => None,
        }
    }
}

#[async_trait]
impl ObservedValueSource for MetricsObservedValueSource {
    async fn observed_value(&self, condition: &Condition, user_id: &str, _asof_date: NaiveDate) -> Option<Decimal> {
        let Condition::Metric { metric_name, .. } = condition else {
            return None;
        };
        let portfolio_id = PortfolioId::new(user_id);
        let metrics = self.repo.latest_metrics(&portfolio_id).await.ok()??;
        Self::field(metric_name, &metrics)
    }
}
