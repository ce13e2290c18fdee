//! Derived, per-`(portfolio, asof_date, pack)` metrics rows.

mod attribution;
mod daily_value;
mod portfolio_metrics;

pub use attribution::CurrencyAttribution;
pub use daily_value::PortfolioDailyValue;
pub use portfolio_metrics::{FactorExposure, PortfolioMetrics};
