//! Transactions and cash flows, derived rows that feed the money-weighted
//! return calculation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{PortfolioId, Quantity, Symbol};

/// Typed transaction event recorded against a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Split,
    WithholdingTax,
}

/// A single ledger transaction.
///
/// A dividend paid across currencies must carry the FX rate observed at the
/// *pay date*, not the ex-date — `fx_rate_at_pay_date` is the field that
/// carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub portfolio_id: PortfolioId,
    pub security_id: Symbol,
    pub transaction_type: TransactionType,
    pub quantity: Quantity,
    pub amount: Decimal,
    pub currency: String,
    pub trade_date: NaiveDate,
    pub pay_date: NaiveDate,
    /// FX rate observed at `pay_date`, required for cross-currency dividends.
    pub fx_rate_at_pay_date: Option<Decimal>,
}

/// A cash-flow row derived from a transaction by the daily-valuation job.
///
/// Feeds the money-weighted-return IRR solve as a signed cash flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    pub portfolio_id: PortfolioId,
    pub date: NaiveDate,
    /// Signed amount in the portfolio's base currency: positive for
    /// external deposits and income received, negative for withdrawals.
    pub amount_base_ccy: Decimal,
    pub recorded_at: DateTime<Utc>,
}
