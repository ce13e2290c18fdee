//! The external book of record, pinned by commit hash.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::shared::Symbol;

/// A parsed holding from the external book, one per `(account, security)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub account: String,
    pub security_id: Symbol,
    pub quantity: Decimal,
    pub cost_per_unit: Decimal,
    pub cost_currency: String,
}

/// A named external book pinned by commit hash; the ground truth for
/// reconciliation and for the `ledger_commit_hash` pinned in every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub commit_hash: String,
    pub captured_at: DateTime<Utc>,
    pub holdings: Vec<Holding>,
    /// Cash balance per account, keyed by currency.
    pub cash_balances: HashMap<String, HashMap<String, Decimal>>,
}

impl LedgerSnapshot {
    /// Holdings for one account.
    #[must_use]
    pub fn holdings_for(&self, account: &str) -> Vec<&Holding> {
        self.holdings.iter().filter(|h| h.account == account).collect()
    }

    /// Cash balance for `(account, currency)`, or zero if absent.
    #[must_use]
    pub fn cash_balance(&self, account: &str, currency: &str) -> Decimal {
        self.cash_balances
            .get(account)
            .and_then(|by_ccy| by_ccy.get(currency))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_snapshot() -> LedgerSnapshot {
        let mut cash = HashMap::new();
        let mut by_ccy = HashMap::new();
        by_ccy.insert("USD".to_string(), dec!(5000.00));
        cash.insert("acct-1".to_string(), by_ccy);

        LedgerSnapshot {
            commit_hash: "abc123".to_string(),
            captured_at: Utc::now(),
            holdings: vec![Holding {
                account: "acct-1".to_string(),
                security_id: Symbol::new("AAPL"),
                quantity: dec!(100),
                cost_per_unit: dec!(150.25),
                cost_currency: "USD".to_string(),
            }],
            cash_balances: cash,
        }
    }

    #[test]
    fn holdings_for_filters_by_account() {
        let snap = sample_snapshot();
        assert_eq!(snap.holdings_for("acct-1").len(), 1);
        assert_eq!(snap.holdings_for("acct-2").len(), 0);
    }

    #[test]
    fn cash_balance_returns_zero_when_absent() {
        let snap = sample_snapshot();
        assert_eq!(snap.cash_balance("acct-1", "USD"), dec!(5000.00));
        assert_eq!(snap.cash_balance("acct-1", "EUR"), Decimal::ZERO);
        assert_eq!(snap.cash_balance("acct-nope", "USD"), Decimal::ZERO);
    }
}
