//! Small statistical helpers shared by the metrics calculator.
//!
//! Internally these work in `f64` — annualization and covariance involve
//! fractional exponents and square roots that `Decimal` cannot express —
//! and convert back to `Decimal` at the boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// Convert a `Decimal` to `f64`, losslessly enough for statistical use.
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Convert an `f64` back to `Decimal`.
#[must_use]
pub fn from_f64(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default()
}

/// Arithmetic mean, or `None` for an empty series.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n-1 denominator). `None` with fewer than two
/// observations.
#[must_use]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Sample covariance between two equal-length series.
#[must_use]
pub fn covariance(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sum: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    Some(sum / (xs.len() - 1) as f64)
}

/// Geometric link of a daily return series: `Π(1 + r_t) - 1`.
#[must_use]
pub fn geometric_link(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Annualize a cumulative return over `n_days` calendar days:
/// `(1 + r)^(365/n_days) - 1`.
#[must_use]
pub fn annualize(cumulative_return: f64, n_days: i64) -> Option<f64> {
    if n_days <= 0 {
        return None;
    }
    let exponent = DAYS_PER_YEAR / n_days as f64;
    Some((1.0 + cumulative_return).powf(exponent) - 1.0)
}

/// Annualize a per-period standard deviation of daily returns by `sqrt(252)`.
#[must_use]
pub fn annualize_volatility(daily_std_dev: f64) -> f64 {
    daily_std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown over a cumulative-wealth path reconstructed from daily
/// returns (wealth starts at 1.0). `None` for an empty series.
#[must_use]
pub fn max_drawdown(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut wealth = 1.0;
    let mut running_max = 1.0;
    let mut worst: f64 = 0.0;
    for r in returns {
        wealth *= 1.0 + r;
        running_max = running_max.max(wealth);
        let drawdown = (running_max - wealth) / running_max;
        worst = worst.max(drawdown);
    }
    Some(worst)
}
