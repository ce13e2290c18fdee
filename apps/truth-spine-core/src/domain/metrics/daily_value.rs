//! Per-portfolio daily valuation, the input series every rolling metric reads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{PackId, PortfolioId};

/// A portfolio's valuation and daily return for one as-of date, keyed by
/// `(portfolio, asof_date, pack)` with `UPSERT` semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioDailyValue {
    pub portfolio_id: PortfolioId,
    pub asof_date: NaiveDate,
    pub pricing_pack_id: PackId,
    pub market_value_base_ccy: Decimal,
    /// Daily return, persisted so rolling-window calculations read it back
    /// rather than recomputing from valuations each time.
    pub daily_return: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn row_is_keyed_by_portfolio_date_pack() {
        let row = PortfolioDailyValue {
            portfolio_id: PortfolioId::new("port-1"),
            asof_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            pricing_pack_id: PackId::new("pack-1"),
            market_value_base_ccy: dec!(105_000.00),
            daily_return: dec!(0.0012),
        };
        assert_eq!(row.daily_return, dec!(0.0012));
    }
}
