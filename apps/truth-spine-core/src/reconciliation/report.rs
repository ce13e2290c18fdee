//! Reconciliation report types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::discrepancy::Discrepancy;
use crate::domain::shared::{PackId, PortfolioId};

/// Pass/fail outcome of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    Pass,
    Fail,
}

/// Result of reconciling a portfolio's ledger snapshot against the database
/// for a given pricing pack.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub portfolio_id: PortfolioId,
    pub asof_date: NaiveDate,
    pub pricing_pack_id: PackId,
    pub status: ReconciliationStatus,
    pub discrepancies: Vec<Discrepancy>,
    pub positions_compared: usize,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ReconciliationReport {
    /// Whether any discrepancy was found; a report with zero discrepancies
    /// is always [`ReconciliationStatus::Pass`].
    #[must_use]
    pub fn has_discrepancies(&self) -> bool {
        !self.discrepancies.is_empty()
    }
}
