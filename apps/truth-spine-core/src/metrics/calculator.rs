//! Portfolio metrics calculator: TWR/MWR, volatility, Sharpe, alpha/beta,
//! tracking error, information ratio, max drawdown, and currency
//! attribution.
//!
//! Consumes the persisted daily return series (`PortfolioDailyValue` rows)
//! and a benchmark return series, and produces the nullable-metric rows
//! `PortfolioMetrics`/`CurrencyAttribution` defined in `domain::metrics`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::MetricsError;
use super::math::{
    annualize, annualize_volatility, covariance, from_f64, geometric_link, max_drawdown, mean,
    std_dev, to_f64,
};
use crate::domain::metrics::CurrencyAttribution;
use crate::domain::shared::{PackId, PortfolioId, Symbol};

/// Identity tolerance in basis points (spec: 0.1bp).
const ATTRIBUTION_TOLERANCE_BP: f64 = 0.1;

/// One dated daily return observation.
#[derive(Debug, Clone, Copy)]
pub struct ReturnObservation {
    pub date: NaiveDate,
    pub daily_return: Decimal,
}

/// Time-weighted return over a series: geometric link of daily returns.
/// `None` if the series is empty.
#[must_use]
pub fn time_weighted_return(observations: &[ReturnObservation]) -> Option<Decimal> {
    if observations.is_empty() {
        return None;
    }
    let returns: Vec<f64> = observations.iter().map(|o| to_f64(o.daily_return)).collect();
    Some(from_f64(geometric_link(&returns)))
}

/// Annualize a cumulative return computed over a window spanning
/// `(start_date, end_date)` inclusive.
#[must_use]
pub fn annualized_return(cumulative: Decimal, start_date: NaiveDate, end_date: NaiveDate) -> Option<Decimal> {
    let n_days = (end_date - start_date).num_days().max(1);
    annualize(to_f64(cumulative), n_days).map(from_f64)
}

/// Money-weighted return: the internal rate of return on a signed
/// cash-flow series (deposits negative, withdrawals/terminal value
/// positive from the investor's perspective), solved by bisection.
///
/// `cash_flows` are `(days_from_valuation_start, amount)` pairs in
/// chronological order; the terminal portfolio value itself should be
/// included as the final flow.
#[must_use]
pub fn money_weighted_return(cash_flows: &[(i64, Decimal)]) -> Option<Decimal> {
    if cash_flows.len() < 2 {
        return None;
    }
    let flows: Vec<(f64, f64)> = cash_flows
        .iter()
        .map(|(days, amount)| (*days as f64 / 365.0, to_f64(*amount)))
        .collect();

    let npv = |rate: f64| -> f64 { flows.iter().map(|(t, cf)| cf / (1.0 + rate).powf(*t)).sum() };

    let (mut lo, mut hi) = (-0.99, 10.0);
    let (mut f_lo, f_hi) = (npv(lo), npv(hi));
    if f_lo.signum() == f_hi.signum() {
        return None;
    }
    let mut mid = 0.0;
    for _ in 0..100 {
        mid = (lo + hi) / 2.0;
        let f_mid = npv(mid);
        if f_mid.abs() < 1e-9 {
            break;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(from_f64(mid))
}

/// Annualized volatility of a daily return series (`sqrt(252)` scaling).
/// `None` with fewer than two observations.
#[must_use]
pub fn volatility(observations: &[ReturnObservation]) -> Option<Decimal> {
    let returns: Vec<f64> = observations.iter().map(|o| to_f64(o.daily_return)).collect();
    std_dev(&returns).map(|s| from_f64(annualize_volatility(s)))
}

/// Sharpe ratio: `(annualized_return - rf) / annualized_volatility`.
/// `None` if volatility is zero or unavailable.
#[must_use]
pub fn sharpe_ratio(annualized_return: Decimal, risk_free_rate: Decimal, annualized_vol: Decimal) -> Option<Decimal> {
    if annualized_vol == Decimal::ZERO {
        return None;
    }
    Some((annualized_return - risk_free_rate) / annualized_vol)
}

/// Beta: `cov(portfolio, benchmark) / var(benchmark)`.
#[must_use]
pub fn beta(portfolio: &[ReturnObservation], benchmark: &[ReturnObservation]) -> Option<Decimal> {
    let p: Vec<f64> = portfolio.iter().map(|o| to_f64(o.daily_return)).collect();
    let b: Vec<f64> = benchmark.iter().map(|o| to_f64(o.daily_return)).collect();
    let cov = covariance(&p, &b)?;
    let var_b = covariance(&b, &b)?;
    if var_b == 0.0 {
        return None;
    }
    Some(from_f64(cov / var_b))
}

/// Alpha: excess of annualized portfolio return over beta-weighted
/// annualized benchmark return.
#[must_use]
pub fn alpha(annualized_portfolio: Decimal, beta: Decimal, annualized_benchmark: Decimal) -> Decimal {
    annualized_portfolio - beta * annualized_benchmark
}

/// Tracking error: annualized standard deviation of `portfolio -
/// benchmark` daily returns. Benchmark returns must already be hedged
/// into the portfolio's base currency by the caller.
#[must_use]
pub fn tracking_error(portfolio: &[ReturnObservation], benchmark: &[ReturnObservation]) -> Option<Decimal> {
    if portfolio.len() != benchmark.len() {
        return None;
    }
    let diffs: Vec<f64> = portfolio
        .iter()
        .zip(benchmark)
        .map(|(p, b)| to_f64(p.daily_return) - to_f64(b.daily_return))
        .collect();
    std_dev(&diffs).map(|s| from_f64(annualize_volatility(s)))
}

/// Information ratio: `alpha / tracking_error`.
#[must_use]
pub fn information_ratio(alpha: Decimal, tracking_error: Decimal) -> Option<Decimal> {
    if tracking_error == Decimal::ZERO {
        return None;
    }
    Some(alpha / tracking_error)
}

/// Max drawdown over the cumulative-wealth path implied by the return
/// series. `None` for an empty series.
#[must_use]
pub fn max_drawdown_over(observations: &[ReturnObservation]) -> Option<Decimal> {
    let returns: Vec<f64> = observations.iter().map(|o| to_f64(o.daily_return)).collect();
    max_drawdown(&returns).map(from_f64)
}

/// Build and validate a currency attribution row for one position (or the
/// portfolio-level aggregate, with `security_id = None`).
///
/// # Errors
///
/// Returns [`MetricsError::AttributionIdentityViolation`] if the identity
/// `r_base = r_local + r_fx + r_interaction` does not hold within 0.1bp.
pub fn currency_attribution(
    portfolio_id: PortfolioId,
    asof_date: NaiveDate,
    pricing_pack_id: PackId,
    security_id: Option<Symbol>,
    r_local: Decimal,
    fx_start: Decimal,
    fx_end: Decimal,
    weight: Option<Decimal>,
) -> Result<CurrencyAttribution, MetricsError> {
    let r_fx = if fx_start == Decimal::ZERO {
        Decimal::ZERO
    } else {
        fx_end / fx_start - Decimal::ONE
    };
    let r_interaction = r_local * r_fx;
    let r_base = (Decimal::ONE + r_local) * (Decimal::ONE + r_fx) - Decimal::ONE;
    let computed = r_local + r_fx + r_interaction;
    let residual_bp = (computed - r_base).abs() * dec!(10_000);

    if to_f64(residual_bp) > ATTRIBUTION_TOLERANCE_BP {
        return Err(MetricsError::AttributionIdentityViolation {
            portfolio_id,
            computed,
            actual: r_base,
            residual_bp,
        });
    }

    Ok(CurrencyAttribution {
        portfolio_id,
        asof_date,
        pricing_pack_id,
        security_id,
        r_local,
        r_fx,
        r_interaction,
        r_base,
        weight,
    })
}

/// Aggregate position-level attribution rows into the portfolio-level row
/// by weight-sum.
#[must_use]
pub fn aggregate_portfolio_attribution(
    portfolio_id: PortfolioId,
    asof_date: NaiveDate,
    pricing_pack_id: PackId,
    positions: &[CurrencyAttribution],
) -> CurrencyAttribution {
    let weighted = |f: fn(&CurrencyAttribution) -> Decimal| -> Decimal {
        positions
            .iter()
            .map(|p| f(p) * p.weight.unwrap_or(Decimal::ZERO))
            .sum()
    };
    CurrencyAttribution {
        portfolio_id,
        asof_date,
        pricing_pack_id,
        security_id: None,
        r_local: weighted(|p| p.r_local),
        r_fx: weighted(|p| p.r_fx),
        r_interaction: weighted(|p| p.r_interaction),
        r_base: weighted(|p| p.r_base),
        weight: None,
    }
}

/// Mean of a return series, for Sharpe/Sortino-style inputs that want the
/// plain (un-annualized) average. `None` if empty.
#[must_use]
pub fn mean_return(observations: &[ReturnObservation]) -> Option<Decimal> {
    let returns: Vec<f64> = observations.iter().map(|o| to_f64(o.daily_return)).collect();
    mean(&returns).map(from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(values: &[f64]) -> Vec<ReturnObservation> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ReturnObservation {
                date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                daily_return: from_f64(*v),
            })
            .collect()
    }

    #[test]
    fn twr_compounds_daily_returns() {
        let series = obs(&[0.01, 0.02, -0.01]);
        let twr = time_weighted_return(&series).unwrap();
        let expected = 1.01 * 1.02 * 0.99 - 1.0;
        assert!((to_f64(twr) - expected).abs() < 1e-9);
    }

    #[test]
    fn twr_of_empty_series_is_null() {
        assert!(time_weighted_return(&[]).is_none());
    }

    #[test]
    fn volatility_requires_two_observations() {
        assert!(volatility(&obs(&[0.01])).is_none());
        assert!(volatility(&obs(&[0.01, -0.01, 0.02])).is_some());
    }

    #[test]
    fn beta_of_series_against_itself_is_one() {
        let series = obs(&[0.01, -0.02, 0.03, 0.0, -0.01]);
        let b = beta(&series, &series).unwrap();
        assert!((to_f64(b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn currency_attribution_identity_holds_for_small_moves() {
        let row = currency_attribution(
            PortfolioId::new("port-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            Some(Symbol::new("NESN")),
            dec!(0.015),
            dec!(1.0),
            dec!(0.98667),
            Some(dec!(1.0)),
        )
        .unwrap();
        assert!(row.r_base != Decimal::ZERO);
    }

    #[test]
    fn max_drawdown_over_flat_series_is_zero() {
        let series = obs(&[0.0, 0.0, 0.0]);
        let dd = max_drawdown_over(&series).unwrap();
        assert_eq!(dd, Decimal::ZERO);
    }

    #[test]
    fn money_weighted_return_matches_known_irr() {
        // -100 now, +110 in exactly one year -> IRR of 10%.
        let flows = vec![(0, dec!(-100)), (365, dec!(110))];
        let irr = money_weighted_return(&flows).unwrap();
        assert!((to_f64(irr) - 0.10).abs() < 1e-3);
    }
}
