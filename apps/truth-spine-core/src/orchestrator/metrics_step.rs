//! Daily metrics computation: turns today's valuation plus the persisted
//! return history into the standard metric set.
//!
//! Grounded on `original_source/backend/app/services/metrics_service.py`'s
//! nightly recompute loop; the actual math lives in
//! [`crate::metrics::calculator`] and is only driven from here.
//!
//! Benchmark-relative figures (alpha, beta, tracking error, information
//! ratio) and money-weighted returns need a benchmark return series and a
//! cash-flow ledger respectively, neither of which this step has a source
//! for yet — they persist as `null` until a benchmark feed and cash-flow
//! reader are wired in, same as the spec's own short-window-is-null rule.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::metrics::{PortfolioDailyValue, PortfolioMetrics};
use crate::domain::shared::{PackId, PortfolioId};
use crate::infrastructure::persistence::{MetricsRepository, PersistenceError};
use crate::metrics::{annualized_return, max_drawdown_over, sharpe_ratio, time_weighted_return, volatility, ReturnObservation};

/// Computes and persists one portfolio's daily value and metrics row.
pub struct DailyMetricsEngine {
    repo: Arc<dyn MetricsRepository>,
    risk_free_rate_annual: Decimal,
}

fn quarter_start(date: NaiveDate) -> NaiveDate {
    let quarter_month = ((date.month0() / 3) * 3) + 1;
    NaiveDate::from_ymd_opt(date.year(), quarter_month, 1).unwrap_or(date)
}

impl DailyMetricsEngine {
    #[must_use]
    pub fn new(repo: Arc<dyn MetricsRepository>, risk_free_rate_annual: Decimal) -> Self {
        Self { repo, risk_free_rate_annual }
    }

    /// Record today's valuation, then recompute and persist the metrics row
    /// for `portfolio_id` as of `asof_date`.
    pub async fn compute_and_store(
        &self,
        portfolio_id: PortfolioId,
        asof_date: NaiveDate,
        pricing_pack_id: PackId,
        market_value_base_ccy: Decimal,
    ) -> Result<(), PersistenceError> {
        let history = self
            .repo
            .daily_values_since(&portfolio_id, asof_date - Duration::days(5 * 365))
            .await?;
        let previous_value = history.last().map(|v| v.market_value_base_ccy);
        let daily_return = match previous_value {
            Some(prev) if prev != Decimal::ZERO => (market_value_base_ccy - prev) / prev,
            _ => Decimal::ZERO,
        };

        let today_row = PortfolioDailyValue {
            portfolio_id: portfolio_id.clone(),
            asof_date,
            pricing_pack_id: pricing_pack_id.clone(),
            market_value_base_ccy,
            daily_return,
        };
        self.repo.upsert_daily_value(today_row.clone()).await?;

        let mut series = history;
        series.push(today_row);
        let observations: Vec<ReturnObservation> = series
            .iter()
            .map(|v| ReturnObservation { date: v.asof_date, daily_return: v.daily_return })
            .collect();

        let window_from = |start: NaiveDate| -> Vec<ReturnObservation> {
            observations.iter().copied().filter(|o| o.date > start && o.date <= asof_date).collect()
        };
        let cumulative_since = |start: NaiveDate| time_weighted_return(&window_from(start));

        let month_start = NaiveDate::from_ymd_opt(asof_date.year(), asof_date.month(), 1).unwrap_or(asof_date);
        let year_start = NaiveDate::from_ymd_opt(asof_date.year(), 1, 1).unwrap_or(asof_date);
        let one_year_ago = asof_date - Duration::days(365);
        let three_years_ago = asof_date - Duration::days(3 * 365);
        let five_years_ago = asof_date - Duration::days(5 * 365);
        let inception = observations.first().map(|o| o.date).unwrap_or(asof_date);

        let twr_1y = cumulative_since(one_year_ago);
        let twr_3y = cumulative_since(three_years_ago);
        let twr_5y = cumulative_since(five_years_ago);
        let twr_inception = cumulative_since(inception - Duration::days(1));

        let volatility_1y = volatility(&window_from(one_year_ago));
        let annualized_1y = twr_1y.and_then(|twr| annualized_return(twr, one_year_ago, asof_date));
        let sharpe_1y = match (annualized_1y, volatility_1y) {
            (Some(ar), Some(vol)) => sharpe_ratio(ar, self.risk_free_rate_annual, vol),
            _ => None,
        };

        let metrics = PortfolioMetrics {
            portfolio_id,
            asof_date,
            pricing_pack_id,
            twr_1d: Some(daily_return),
            twr_mtd: cumulative_since(month_start - Duration::days(1)),
            twr_qtd: cumulative_since(quarter_start(asof_date) - Duration::days(1)),
            twr_ytd: cumulative_since(year_start - Duration::days(1)),
            twr_1y,
            twr_3y_annualized: twr_3y.and_then(|twr| annualized_return(twr, three_years_ago, asof_date)),
            twr_5y_annualized: twr_5y.and_then(|twr| annualized_return(twr, five_years_ago, asof_date)),
            twr_inception_annualized: twr_inception.and_then(|twr| annualized_return(twr, inception, asof_date)),
            mwr_1y: None,
            mwr_3y_annualized: None,
            mwr_5y_annualized: None,
            mwr_inception_annualized: None,
            volatility_1y,
            sharpe_1y,
            alpha_1y: None,
            beta_1y: None,
            tracking_error_1y: None,
            information_ratio_1y: None,
            max_drawdown: max_drawdown_over(&observations),
        };
        self.repo.upsert_metrics(metrics).await
    }
}
