//! Errors raised computing portfolio metrics.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::shared::PortfolioId;

/// Errors from the metrics calculator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    /// The currency attribution identity `r_base = r_local + r_fx +
    /// r_interaction` did not hold within 0.1bp tolerance.
    #[error(
        "currency attribution identity violated for portfolio {portfolio_id}: computed {computed}, actual {actual}, residual {residual_bp}bp"
    )]
    AttributionIdentityViolation {
        /// The portfolio whose attribution failed validation.
        portfolio_id: PortfolioId,
        /// `r_local + r_fx + r_interaction`.
        computed: Decimal,
        /// The reported `r_base`.
        actual: Decimal,
        /// `|computed - actual|` in basis points.
        residual_bp: Decimal,
    },
}
