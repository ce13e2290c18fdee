//! Database-side position snapshot for reconciliation.
//!
//! The counterpart to [`crate::domain::ledger::LedgerSnapshot`] — the
//! persisted positions the nightly job reconciles the ledger against.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single database-recorded position for one account and security.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabasePosition {
    pub account: String,
    pub security_id: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub cost_currency: String,
    pub market_value_base_ccy: Decimal,
}

/// A database-recorded cash balance for one account and currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseCashBalance {
    pub account: String,
    pub currency: String,
    pub amount: Decimal,
}

/// Complete database-side snapshot compared against a ledger snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub positions: Vec<DatabasePosition>,
    pub cash_balances: Vec<DatabaseCashBalance>,
}

impl DatabaseSnapshot {
    #[must_use]
    pub fn position_for(&self, account: &str, security_id: &str) -> Option<&DatabasePosition> {
        self.positions
            .iter()
            .find(|p| p.account == account && p.security_id == security_id)
    }

    #[must_use]
    pub fn cash_balance_for(&self, account: &str, currency: &str) -> Option<Decimal> {
        self.cash_balances
            .iter()
            .find(|c| c.account == account && c.currency == currency)
            .map(|c| c.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_for_finds_matching_account_and_security() {
        let snapshot = DatabaseSnapshot {
            positions: vec![DatabasePosition {
                account: "acct-1".to_string(),
                security_id: "AAPL".to_string(),
                quantity: Decimal::new(100, 0),
                cost_basis: Decimal::new(15000, 2),
                cost_currency: "USD".to_string(),
                market_value_base_ccy: Decimal::new(20000, 2),
            }],
            cash_balances: vec![],
        };
        assert!(snapshot.position_for("acct-1", "AAPL").is_some());
        assert!(snapshot.position_for("acct-1", "MSFT").is_none());
    }

    #[test]
    fn cash_balance_for_finds_matching_currency() {
        let snapshot = DatabaseSnapshot {
            positions: vec![],
            cash_balances: vec![DatabaseCashBalance {
                account: "acct-1".to_string(),
                currency: "USD".to_string(),
                amount: Decimal::new(50_000, 2),
            }],
        };
        assert_eq!(
            snapshot.cash_balance_for("acct-1", "USD"),
            Some(Decimal::new(50_000, 2))
        );
        assert_eq!(snapshot.cash_balance_for("acct-1", "EUR"), None);
    }
}
