//! Alert condition types and their creation-time validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Comparison operators a condition may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equal,
    NotEqual,
}

impl ComparisonOperator {
    /// Apply the operator to `(observed, threshold)`.
    #[must_use]
    pub fn apply(self, observed: Decimal, threshold: Decimal) -> bool {
        match self {
            Self::GreaterThan => observed > threshold,
            Self::LessThan => observed < threshold,
            Self::GreaterThanOrEqual => observed >= threshold,
            Self::LessThanOrEqual => observed <= threshold,
            Self::Equal => observed == threshold,
            Self::NotEqual => observed != threshold,
        }
    }
}

/// Errors raised validating a condition at creation time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("unknown {kind} entity: {name}")]
    UnknownEntity { kind: &'static str, name: String },
    #[error("news_sentiment threshold {0} is outside [-1, 1]")]
    SentimentOutOfRange(Decimal),
}

/// One of the five strictly validated alert condition shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// A named macro series level crossing a threshold.
    Macro {
        series_name: String,
        operator: ComparisonOperator,
        threshold: Decimal,
    },
    /// A named portfolio metric crossing a threshold.
    Metric {
        metric_name: String,
        operator: ComparisonOperator,
        threshold: Decimal,
    },
    /// A named quality score crossing a threshold.
    Rating {
        rating_name: String,
        operator: ComparisonOperator,
        threshold: Decimal,
    },
    /// A security price or percent change crossing a threshold.
    Price {
        security_id: String,
        operator: ComparisonOperator,
        threshold: Decimal,
    },
    /// A sentiment score in `[-1, 1]` crossing a threshold.
    NewsSentiment {
        security_id: String,
        operator: ComparisonOperator,
        threshold: Decimal,
    },
}

impl Condition {
    /// Validate this condition against the enumerated vocabulary of known
    /// macro series, metrics and ratings. Price and sentiment conditions
    /// carry their own security identifier and are validated structurally.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError`] if the named entity is not in the
    /// supplied vocabulary, or a sentiment threshold falls outside
    /// `[-1, 1]`.
    pub fn validate(
        &self,
        known_macro_series: &[&str],
        known_metrics: &[&str],
        known_ratings: &[&str],
    ) -> Result<(), ConditionError> {
        match self {
            Self::Macro { series_name, .. } => {
                if !known_macro_series.contains(&series_name.as_str()) {
                    return Err(ConditionError::UnknownEntity {
                        kind: "macro series",
                        name: series_name.clone(),
                    });
                }
            }
            Self::Metric { metric_name, .. } => {
                if !known_metrics.contains(&metric_name.as_str()) {
                    return Err(ConditionError::UnknownEntity {
                        kind: "metric",
                        name: metric_name.clone(),
                    });
                }
            }
            Self::Rating { rating_name, .. } => {
                if !known_ratings.contains(&rating_name.as_str()) {
                    return Err(ConditionError::UnknownEntity {
                        kind: "rating",
                        name: rating_name.clone(),
                    });
                }
            }
            Self::Price { .. } => {}
            Self::NewsSentiment { threshold, .. } => {
                if *threshold < Decimal::NEGATIVE_ONE || *threshold > Decimal::ONE {
                    return Err(ConditionError::SentimentOutOfRange(*threshold));
                }
            }
        }
        Ok(())
    }

    /// Evaluate the condition against an observed value.
    #[must_use]
    pub fn is_satisfied_by(&self, observed: Decimal) -> bool {
        let (operator, threshold) = match self {
            Self::Macro { operator, threshold, .. }
            | Self::Metric { operator, threshold, .. }
            | Self::Rating { operator, threshold, .. }
            | Self::Price { operator, threshold, .. }
            | Self::NewsSentiment { operator, threshold, .. } => (*operator, *threshold),
        };
        operator.apply(observed, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MACRO: &[&str] = &["fed_funds_rate"];
    const METRICS: &[&str] = &["twr_1d"];
    const RATINGS: &[&str] = &["quality_score"];

    #[test]
    fn valid_macro_condition_passes() {
        let c = Condition::Macro {
            series_name: "fed_funds_rate".to_string(),
            operator: ComparisonOperator::GreaterThan,
            threshold: dec!(5.0),
        };
        assert!(c.validate(MACRO, METRICS, RATINGS).is_ok());
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let c = Condition::Metric {
            metric_name: "not_a_real_metric".to_string(),
            operator: ComparisonOperator::LessThan,
            threshold: dec!(0.0),
        };
        assert!(matches!(
            c.validate(MACRO, METRICS, RATINGS),
            Err(ConditionError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn sentiment_threshold_out_of_range_is_rejected() {
        let c = Condition::NewsSentiment {
            security_id: "AAPL".to_string(),
            operator: ComparisonOperator::GreaterThan,
            threshold: dec!(1.5),
        };
        assert!(matches!(
            c.validate(MACRO, METRICS, RATINGS),
            Err(ConditionError::SentimentOutOfRange(_))
        ));
    }

    #[test]
    fn sentiment_threshold_in_range_is_accepted() {
        let c = Condition::NewsSentiment {
            security_id: "AAPL".to_string(),
            operator: ComparisonOperator::LessThan,
            threshold: dec!(-0.5),
        };
        assert!(c.validate(MACRO, METRICS, RATINGS).is_ok());
    }

    #[test]
    fn price_condition_needs_no_vocabulary_check() {
        let c = Condition::Price {
            security_id: "AAPL".to_string(),
            operator: ComparisonOperator::GreaterThan,
            threshold: dec!(200.0),
        };
        assert!(c.validate(&[], &[], &[]).is_ok());
    }

    #[test]
    fn is_satisfied_by_applies_operator() {
        let c = Condition::Price {
            security_id: "AAPL".to_string(),
            operator: ComparisonOperator::GreaterThanOrEqual,
            threshold: dec!(190.0),
        };
        assert!(c.is_satisfied_by(dec!(190.0)));
        assert!(c.is_satisfied_by(dec!(200.0)));
        assert!(!c.is_satisfied_by(dec!(180.0)));
    }

    #[test]
    fn all_operators_apply_correctly() {
        let cases = [
            (ComparisonOperator::GreaterThan, dec!(5), dec!(3), true),
            (ComparisonOperator::LessThan, dec!(3), dec!(5), true),
            (ComparisonOperator::GreaterThanOrEqual, dec!(5), dec!(5), true),
            (ComparisonOperator::LessThanOrEqual, dec!(5), dec!(5), true),
            (ComparisonOperator::Equal, dec!(5), dec!(5), true),
            (ComparisonOperator::NotEqual, dec!(5), dec!(3), true),
        ];
        for (op, observed, threshold, expected) in cases {
            assert_eq!(op.apply(observed, threshold), expected);
        }
    }
}
