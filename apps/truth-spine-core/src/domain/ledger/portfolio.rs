//! Portfolio and lot entities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{DomainError, PortfolioId, Quantity, Symbol};

/// A portfolio tracked by the ledger; owns lots and transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: PortfolioId,
    pub base_currency: String,
    pub name: String,
}

/// An open-quantity position with cost basis.
///
/// Invariants: `quantity_open <= quantity_original`, cost basis is
/// non-negative, and an open lot has `quantity_open > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub portfolio_id: PortfolioId,
    pub security_id: Symbol,
    pub quantity_original: Quantity,
    pub quantity_open: Quantity,
    pub cost_basis: Decimal,
    pub cost_currency: String,
}

impl Lot {
    /// Validate the lot invariants from spec.md §3.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first violated invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity_open > self.quantity_original {
            return Err(DomainError::InvariantViolation {
                aggregate: "Lot".to_string(),
                invariant: "quantity_open <= quantity_original".to_string(),
                state: format!(
                    "quantity_open={}, quantity_original={}",
                    self.quantity_open, self.quantity_original
                ),
            });
        }
        if self.cost_basis < Decimal::ZERO {
            return Err(DomainError::InvariantViolation {
                aggregate: "Lot".to_string(),
                invariant: "cost_basis is non-negative".to_string(),
                state: format!("cost_basis={}", self.cost_basis),
            });
        }
        if self.is_open() && !self.quantity_open.is_positive() {
            return Err(DomainError::InvariantViolation {
                aggregate: "Lot".to_string(),
                invariant: "open lots have quantity_open > 0".to_string(),
                state: format!("quantity_open={}", self.quantity_open),
            });
        }
        Ok(())
    }

    /// A lot is open while any of its original quantity remains.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.quantity_open.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_lot(quantity_open: i64, quantity_original: i64, cost_basis: Decimal) -> Lot {
        Lot {
            portfolio_id: PortfolioId::new("port-1"),
            security_id: Symbol::new("AAPL"),
            quantity_original: Quantity::from_i64(quantity_original),
            quantity_open: Quantity::from_i64(quantity_open),
            cost_basis,
            cost_currency: "USD".to_string(),
        }
    }

    #[test]
    fn valid_lot_passes() {
        let lot = sample_lot(100, 100, dec!(19012.00));
        assert!(lot.validate().is_ok());
    }

    #[test]
    fn open_exceeding_original_is_invalid() {
        let lot = sample_lot(101, 100, dec!(19012.00));
        assert!(lot.validate().is_err());
    }

    #[test]
    fn negative_cost_basis_is_invalid() {
        let lot = sample_lot(100, 100, dec!(-1.00));
        assert!(lot.validate().is_err());
    }

    #[test]
    fn closed_lot_with_zero_quantity_is_valid() {
        let lot = sample_lot(0, 100, dec!(19012.00));
        assert!(lot.validate().is_ok());
        assert!(!lot.is_open());
    }
}
