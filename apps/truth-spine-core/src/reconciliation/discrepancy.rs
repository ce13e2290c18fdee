//! Discrepancy types for ledger-vs-pack reconciliation.
//!
//! Types for representing and categorizing mismatches between a ledger
//! snapshot and the persisted database positions it is checked against.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category of a detected discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyType {
    /// Position quantity differs between ledger and database.
    QuantityMismatch,
    /// Cost basis differs by more than one cent.
    CostMismatch,
    /// Cash balance differs by more than one cent.
    CashMismatch,
    /// Market valuation differs by more than the 1bp tolerance.
    ValuationMismatch,
    /// A position exists in one side but not the other.
    MissingPosition,
    /// An error prevented the comparison from completing.
    System,
}

impl std::fmt::Display for DiscrepancyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuantityMismatch => write!(f, "QUANTITY_MISMATCH"),
            Self::CostMismatch => write!(f, "COST_MISMATCH"),
            Self::CashMismatch => write!(f, "CASH_MISMATCH"),
            Self::ValuationMismatch => write!(f, "VALUATION_MISMATCH"),
            Self::MissingPosition => write!(f, "MISSING_POSITION"),
            Self::System => write!(f, "SYSTEM"),
        }
    }
}

/// A detected discrepancy between a ledger snapshot and the database.
#[derive(Debug, Clone, Serialize)]
pub struct Discrepancy {
    pub discrepancy_type: DiscrepancyType,
    /// Account and security identifying the row under comparison.
    pub account: String,
    pub security_id: Option<String>,
    /// Ledger-side value, stringified for heterogeneous fields.
    pub ledger_value: String,
    /// Database-side value, stringified for heterogeneous fields.
    pub database_value: String,
    /// Relative or absolute deviation observed, when numeric.
    pub deviation: Option<Decimal>,
    pub detected_at: chrono::DateTime<chrono::Utc>,
}
