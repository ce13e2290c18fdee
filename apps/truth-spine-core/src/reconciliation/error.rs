//! Reconciliation error types.

/// Errors from ledger reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    /// The database position repository could not be read.
    #[error("database read error: {0}")]
    DatabaseError(String),

    /// The ledger snapshot could not be captured or parsed.
    #[error("ledger snapshot error: {0}")]
    LedgerError(String),

    /// No pricing pack was available to value the comparison against.
    #[error("no pricing pack available for valuation")]
    NoPricingPack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_error_display() {
        let err = ReconciliationError::DatabaseError("connection refused".to_string());
        assert_eq!(format!("{err}"), "database read error: connection refused");
    }

    #[test]
    fn ledger_error_display() {
        let err = ReconciliationError::LedgerError("malformed commit".to_string());
        assert_eq!(format!("{err}"), "ledger snapshot error: malformed commit");
    }

    #[test]
    fn no_pricing_pack_display() {
        let err = ReconciliationError::NoPricingPack;
        assert_eq!(format!("{err}"), "no pricing pack available for valuation");
    }
}
