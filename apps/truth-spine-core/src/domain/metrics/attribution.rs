//! Currency attribution: decomposition of a base-currency return into
//! local, FX, and interaction components.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{PackId, PortfolioId, Symbol};

/// The three-term decomposition of one position's (or the portfolio's)
/// base-currency return, keyed by `(portfolio, asof_date, pack)` plus an
/// optional `security_id` for position-level rows (`None` for the
/// portfolio-level aggregate row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAttribution {
    pub portfolio_id: PortfolioId,
    pub asof_date: NaiveDate,
    pub pricing_pack_id: PackId,
    pub security_id: Option<Symbol>,

    /// Return in the position's native currency.
    pub r_local: Decimal,
    /// `(fx_end / fx_start) - 1`.
    pub r_fx: Decimal,
    /// `r_local * r_fx`, reported rather than elided.
    pub r_interaction: Decimal,
    /// `(1 + r_local)(1 + r_fx) - 1 = r_local + r_fx + r_interaction`.
    pub r_base: Decimal,
    /// This position's weight in the portfolio aggregation: its
    /// base-currency market value divided by portfolio base-currency market
    /// value. `None` for the portfolio-level row.
    pub weight: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn identity_holds_for_sample_components() {
        // From spec.md S3: r_local=0.015, r_fx≈-0.01333, r_interaction≈-0.0002, r_base≈0.001467
        let row = CurrencyAttribution {
            portfolio_id: PortfolioId::new("port-1"),
            asof_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            pricing_pack_id: PackId::new("pack-1"),
            security_id: Some(Symbol::new("NESN")),
            r_local: dec!(0.015),
            r_fx: dec!(-0.013333),
            r_interaction: dec!(-0.0002),
            r_base: dec!(0.001467),
            weight: Some(dec!(1.0)),
        };
        let computed = row.r_local + row.r_fx + row.r_interaction;
        let residual_bp = (computed - row.r_base).abs() * dec!(10_000);
        assert!(residual_bp < dec!(0.1));
    }

    #[test]
    fn portfolio_level_row_has_no_security_or_weight() {
        let row = CurrencyAttribution {
            portfolio_id: PortfolioId::new("port-1"),
            asof_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            pricing_pack_id: PackId::new("pack-1"),
            security_id: None,
            r_local: dec!(0.01),
            r_fx: dec!(0.0),
            r_interaction: dec!(0.0),
            r_base: dec!(0.01),
            weight: None,
        };
        assert!(row.security_id.is_none());
        assert!(row.weight.is_none());
    }
}
