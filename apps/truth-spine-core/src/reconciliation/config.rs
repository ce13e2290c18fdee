//! Reconciliation tolerances.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Tolerances applied when comparing a ledger snapshot to the database.
///
/// Quantity must match exactly; cost basis and cash balances tolerate up to
/// one cent of floating-point drift; market valuation tolerates a relative
/// deviation of one basis point.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationConfig {
    pub cost_cash_tolerance: Decimal,
    pub valuation_tolerance_bps: Decimal,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            cost_cash_tolerance: dec!(0.01),
            valuation_tolerance_bps: dec!(0.0001),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_one_cent_and_one_bp() {
        let config = ReconciliationConfig::default();
        assert_eq!(config.cost_cash_tolerance, dec!(0.01));
        assert_eq!(config.valuation_tolerance_bps, dec!(0.0001));
    }
}
