//! Ledger aggregate: portfolios, lots, transactions and cash flows, plus the
//! external book snapshot they are reconciled against.

mod portfolio;
mod snapshot;
mod transaction;

pub use portfolio::{Lot, Portfolio};
pub use snapshot::{Holding, LedgerSnapshot};
pub use transaction::{CashFlow, Transaction, TransactionType};
