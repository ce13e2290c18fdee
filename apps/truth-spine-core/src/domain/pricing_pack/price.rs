//! Price and FX rate rows owned by a pricing pack.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{PackId, Symbol};

/// A single security's closing price within one pack.
///
/// Uniquely keyed by `(security, pack)`. Exists only inside the pack that
/// owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub security_id: Symbol,
    pub pricing_pack_id: PackId,
    /// Stored as a string-backed Decimal so `serde` round-trips exactly;
    /// canonical hashing reads it back out as a plain decimal string.
    pub close: Decimal,
    pub currency: String,
    /// Provider this close was fetched from (primary or fallback).
    pub source: String,
}

/// A single currency pair's rate within one pack.
///
/// Uniquely keyed by `(base, quote, pack)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRate {
    pub base_ccy: String,
    pub quote_ccy: String,
    pub pricing_pack_id: PackId,
    pub rate: Decimal,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_equality_by_value() {
        let a = Price {
            security_id: Symbol::new("AAPL"),
            pricing_pack_id: PackId::new("pack-1"),
            close: dec!(190.12),
            currency: "USD".to_string(),
            source: "polygon".to_string(),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn fx_rate_distinct_pairs_not_equal() {
        let eur_usd = FxRate {
            base_ccy: "EUR".to_string(),
            quote_ccy: "USD".to_string(),
            pricing_pack_id: PackId::new("pack-1"),
            rate: dec!(1.08),
            source: "fred".to_string(),
        };
        let gbp_usd = FxRate {
            base_ccy: "GBP".to_string(),
            ..eur_usd.clone()
        };
        assert_ne!(eur_usd, gbp_usd);
    }
}
