//! The two typed error responses the pattern execution endpoint can return
//! instead of [`super::PatternExecutionResponseDto`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returned when the freshness gate is closed: the pack the request would
/// have been pinned to is not yet `fresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceUnavailableDto {
    pub reason: String,
    /// Best-effort estimate of when the gate will open.
    pub estimated_ready: DateTime<Utc>,
}

/// One field-level validation failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Returned when a pattern request fails input validation before
/// dispatch — malformed pattern id, unknown capability, bad argument type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDto {
    pub message: String,
    pub violations: Vec<FieldViolation>,
}

impl ValidationErrorDto {
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: message.clone(),
            violations: vec![FieldViolation { field: field.into(), message }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_violation_is_echoed_in_both_places() {
        let dto = ValidationErrorDto::single("pattern_id", "unknown pattern");
        assert_eq!(dto.violations.len(), 1);
        assert_eq!(dto.violations[0].field, "pattern_id");
    }
}
