//! Portfolio metrics calculator.
//!
//! Distinct from [`crate::domain::metrics`], which holds the persisted
//! result types (`PortfolioMetrics`, `CurrencyAttribution`,
//! `PortfolioDailyValue`) this module computes them from raw return series.

mod calculator;
mod error;
pub mod math;

pub use calculator::{
    ReturnObservation, aggregate_portfolio_attribution, alpha, beta, currency_attribution,
    information_ratio, max_drawdown_over, mean_return, money_weighted_return, sharpe_ratio,
    time_weighted_return, tracking_error, volatility,
};
pub use calculator::annualized_return;
pub use error::MetricsError;
