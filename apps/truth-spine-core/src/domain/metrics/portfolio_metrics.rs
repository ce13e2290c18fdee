//! Persisted performance and factor-exposure results for one portfolio/pack.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{PackId, PortfolioId};

/// A nullable return figure: windows shorter than the available history, or
/// with too few observations, report `null` rather than a partial value.
pub type NullableReturn = Option<Decimal>;

/// The full standard metric set for one `(portfolio, asof_date, pack)` row.
///
/// Persisted with `UPSERT` semantics on that key; re-running the job for
/// the same pack with unchanged inputs is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub portfolio_id: PortfolioId,
    pub asof_date: NaiveDate,
    pub pricing_pack_id: PackId,

    pub twr_1d: NullableReturn,
    pub twr_mtd: NullableReturn,
    pub twr_qtd: NullableReturn,
    pub twr_ytd: NullableReturn,
    pub twr_1y: NullableReturn,
    pub twr_3y_annualized: NullableReturn,
    pub twr_5y_annualized: NullableReturn,
    pub twr_inception_annualized: NullableReturn,

    pub mwr_1y: NullableReturn,
    pub mwr_3y_annualized: NullableReturn,
    pub mwr_5y_annualized: NullableReturn,
    pub mwr_inception_annualized: NullableReturn,

    pub volatility_1y: NullableReturn,
    pub sharpe_1y: NullableReturn,
    pub alpha_1y: NullableReturn,
    pub beta_1y: NullableReturn,
    pub tracking_error_1y: NullableReturn,
    pub information_ratio_1y: NullableReturn,
    pub max_drawdown: NullableReturn,
}

/// A single factor's exposure for a portfolio on one as-of date. Pre-warmed
/// as a non-blocking nightly step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorExposure {
    pub portfolio_id: PortfolioId,
    pub asof_date: NaiveDate,
    pub pricing_pack_id: PackId,
    pub factor_name: String,
    pub exposure: Decimal,
}
