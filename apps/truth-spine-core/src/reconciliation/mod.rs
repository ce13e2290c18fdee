//! Ledger-vs-database reconciliation.
//!
//! Compares a captured [`crate::domain::ledger::LedgerSnapshot`] against the
//! persisted database positions for the same portfolio and pricing pack,
//! applying exact-match and tolerance rules, and emitting a typed
//! [`Discrepancy`] for every row that fails.

mod config;
mod discrepancy;
mod error;
mod report;
mod snapshot;

pub use config::ReconciliationConfig;
pub use discrepancy::{Discrepancy, DiscrepancyType};
pub use error::ReconciliationError;
pub use report::{ReconciliationReport, ReconciliationStatus};
pub use snapshot::{DatabaseCashBalance, DatabasePosition, DatabaseSnapshot};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::ledger::LedgerSnapshot;
use crate::domain::pricing_pack::Price;
use crate::domain::shared::{PackId, PortfolioId};

/// Compares ledger and database state for one portfolio on one pricing pack.
pub struct Reconciler {
    config: ReconciliationConfig,
}

impl Reconciler {
    #[must_use]
    pub fn new(config: ReconciliationConfig) -> Self {
        Self { config }
    }

    /// Reconcile `ledger` against `database` for `portfolio_id` as of
    /// `asof_date`, valuing positions with `prices` (keyed by security id).
    #[must_use]
    pub fn reconcile(
        &self,
        portfolio_id: PortfolioId,
        asof_date: NaiveDate,
        pricing_pack_id: PackId,
        ledger: &LedgerSnapshot,
        database: &DatabaseSnapshot,
        prices: &[Price],
    ) -> ReconciliationReport {
        let started = Utc::now();
        let mut discrepancies = Vec::new();
        let mut positions_compared = 0usize;

        for holding in &ledger.holdings {
            positions_compared += 1;
            let Some(db_position) =
                database.position_for(&holding.account, holding.security_id.as_str())
            else {
                discrepancies.push(Discrepancy {
                    discrepancy_type: DiscrepancyType::MissingPosition,
                    account: holding.account.clone(),
                    security_id: Some(holding.security_id.as_str().to_string()),
                    ledger_value: holding.quantity.to_string(),
                    database_value: "absent".to_string(),
                    deviation: None,
                    detected_at: started,
                });
                continue;
            };

            if holding.quantity != db_position.quantity {
                discrepancies.push(Discrepancy {
                    discrepancy_type: DiscrepancyType::QuantityMismatch,
                    account: holding.account.clone(),
                    security_id: Some(holding.security_id.as_str().to_string()),
                    ledger_value: holding.quantity.to_string(),
                    database_value: db_position.quantity.to_string(),
                    deviation: Some((holding.quantity - db_position.quantity).abs()),
                    detected_at: started,
                });
            }

            let ledger_cost_basis = holding.cost_per_unit * holding.quantity;
            let db_cost_basis = db_position.cost_basis;
            let cost_drift = (ledger_cost_basis - db_cost_basis).abs();
            if cost_drift > self.config.cost_cash_tolerance {
                discrepancies.push(Discrepancy {
                    discrepancy_type: DiscrepancyType::CostMismatch,
                    account: holding.account.clone(),
                    security_id: Some(holding.security_id.as_str().to_string()),
                    ledger_value: ledger_cost_basis.to_string(),
                    database_value: db_cost_basis.to_string(),
                    deviation: Some(cost_drift),
                    detected_at: started,
                });
            }

            if let Some(price) = prices
                .iter()
                .find(|p| p.security_id == holding.security_id)
            {
                let ledger_value = holding.quantity * price.close;
                if ledger_value != Decimal::ZERO {
                    let relative_deviation =
                        (db_position.market_value_base_ccy - ledger_value).abs() / ledger_value;
                    if relative_deviation > self.config.valuation_tolerance_bps {
                        discrepancies.push(Discrepancy {
                            discrepancy_type: DiscrepancyType::ValuationMismatch,
                            account: holding.account.clone(),
                            security_id: Some(holding.security_id.as_str().to_string()),
                            ledger_value: ledger_value.to_string(),
                            database_value: db_position.market_value_base_ccy.to_string(),
                            deviation: Some(relative_deviation),
                            detected_at: started,
                        });
                    }
                }
            }
        }

        for (account, balances) in &ledger.cash_balances {
            for (currency, ledger_amount) in balances {
                let Some(db_amount) = database.cash_balance_for(account, currency) else {
                    discrepancies.push(Discrepancy {
                        discrepancy_type: DiscrepancyType::MissingPosition,
                        account: account.clone(),
                        security_id: None,
                        ledger_value: ledger_amount.to_string(),
                        database_value: "absent".to_string(),
                        deviation: None,
                        detected_at: started,
                    });
                    continue;
                };
                let drift = (*ledger_amount - db_amount).abs();
                if drift > self.config.cost_cash_tolerance {
                    discrepancies.push(Discrepancy {
                        discrepancy_type: DiscrepancyType::CashMismatch,
                        account: account.clone(),
                        security_id: None,
                        ledger_value: ledger_amount.to_string(),
                        database_value: db_amount.to_string(),
                        deviation: Some(drift),
                        detected_at: started,
                    });
                }
            }
        }

        let status = if discrepancies.is_empty() {
            ReconciliationStatus::Pass
        } else {
            ReconciliationStatus::Fail
        };
        let completed_at = Utc::now();
        let duration_ms = (completed_at - started).num_milliseconds().max(0) as u64;

        ReconciliationReport {
            portfolio_id,
            asof_date,
            pricing_pack_id,
            status,
            discrepancies,
            positions_compared,
            completed_at,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::Holding;
    use crate::domain::shared::{PackId, PortfolioId, Symbol};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn ledger_with(quantity: Decimal) -> LedgerSnapshot {
        LedgerSnapshot {
            commit_hash: "abc123".to_string(),
            captured_at: Utc::now(),
            holdings: vec![Holding {
                account: "acct-1".to_string(),
                security_id: Symbol::new("AAPL"),
                quantity,
                cost_per_unit: dec!(150.00),
                cost_currency: "USD".to_string(),
            }],
            cash_balances: HashMap::new(),
        }
    }

    fn database_with(quantity: Decimal) -> DatabaseSnapshot {
        DatabaseSnapshot {
            positions: vec![DatabasePosition {
                account: "acct-1".to_string(),
                security_id: "AAPL".to_string(),
                quantity,
                cost_basis: dec!(15000.00),
                cost_currency: "USD".to_string(),
                market_value_base_ccy: dec!(20000.00),
            }],
            cash_balances: vec![],
        }
    }

    #[test]
    fn matching_positions_pass_with_no_discrepancies() {
        let reconciler = Reconciler::new(ReconciliationConfig::default());
        let report = reconciler.reconcile(
            PortfolioId::new("pf-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            &ledger_with(dec!(100)),
            &database_with(dec!(100)),
            &[],
        );
        assert_eq!(report.status, ReconciliationStatus::Pass);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn quantity_mismatch_s2_scenario_db_100_ledger_101() {
        let reconciler = Reconciler::new(ReconciliationConfig::default());
        let report = reconciler.reconcile(
            PortfolioId::new("pf-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            &ledger_with(dec!(101)),
            &database_with(dec!(100)),
            &[],
        );
        assert_eq!(report.status, ReconciliationStatus::Fail);
        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(
            report.discrepancies[0].discrepancy_type,
            DiscrepancyType::QuantityMismatch
        );
        assert_eq!(report.discrepancies[0].ledger_value, "101");
        assert_eq!(report.discrepancies[0].database_value, "100");
    }

    #[test]
    fn missing_database_position_is_reported() {
        let reconciler = Reconciler::new(ReconciliationConfig::default());
        let database = DatabaseSnapshot {
            positions: vec![],
            cash_balances: vec![],
        };
        let report = reconciler.reconcile(
            PortfolioId::new("pf-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            &ledger_with(dec!(100)),
            &database,
            &[],
        );
        assert_eq!(report.status, ReconciliationStatus::Fail);
        assert_eq!(
            report.discrepancies[0].discrepancy_type,
            DiscrepancyType::MissingPosition
        );
    }

    #[test]
    fn cost_drift_within_one_cent_is_tolerated() {
        let reconciler = Reconciler::new(ReconciliationConfig::default());
        let mut database = database_with(dec!(100));
        database.positions[0].cost_basis = dec!(15000.005);
        let report = reconciler.reconcile(
            PortfolioId::new("pf-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            &ledger_with(dec!(100)),
            &database,
            &[],
        );
        assert_eq!(report.status, ReconciliationStatus::Pass);
    }

    #[test]
    fn valuation_beyond_one_bp_is_reported() {
        let reconciler = Reconciler::new(ReconciliationConfig::default());
        let mut database = database_with(dec!(100));
        database.positions[0].market_value_base_ccy = dec!(25000.00);
        let price = Price {
            security_id: Symbol::new("AAPL"),
            pricing_pack_id: PackId::new("pack-1"),
            close: dec!(150.00),
            currency: "USD".to_string(),
            source: "test".to_string(),
        };
        let report = reconciler.reconcile(
            PortfolioId::new("pf-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            &ledger_with(dec!(100)),
            &database,
            &[price],
        );
        assert!(report
            .discrepancies
            .iter()
            .any(|d| d.discrepancy_type == DiscrepancyType::ValuationMismatch));
    }

    #[test]
    fn cash_mismatch_beyond_one_cent_is_reported() {
        let reconciler = Reconciler::new(ReconciliationConfig::default());
        let mut ledger = ledger_with(dec!(100));
        ledger
            .cash_balances
            .entry("acct-1".to_string())
            .or_default()
            .insert("USD".to_string(), dec!(1000.00));
        let mut database = database_with(dec!(100));
        database.cash_balances.push(DatabaseCashBalance {
            account: "acct-1".to_string(),
            currency: "USD".to_string(),
            amount: dec!(950.00),
        });
        let report = reconciler.reconcile(
            PortfolioId::new("pf-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            &ledger,
            &database,
            &[],
        );
        assert!(report
            .discrepancies
            .iter()
            .any(|d| d.discrepancy_type == DiscrepancyType::CashMismatch));
    }
}
