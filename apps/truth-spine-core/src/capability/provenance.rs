//! Provenance stamped onto every capability result.

use std::time::Duration;

use chrono::NaiveDate;

pub use crate::application::dto::ProvenanceTag;

/// Where a result came from, as-of when, and how long it may be trusted.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub tag: ProvenanceTag,
    /// e.g. `pricing_pack:<id>`, `provider:alpaca`.
    pub source: String,
    pub asof_date: NaiveDate,
    pub ttl: Duration,
}

impl Provenance {
    #[must_use]
    pub fn real(source: impl Into<String>, asof_date: NaiveDate, ttl: Duration) -> Self {
        Self { tag: ProvenanceTag::Real, source: source.into(), asof_date, ttl }
    }

    #[must_use]
    pub fn error(source: impl Into<String>, asof_date: NaiveDate) -> Self {
        Self { tag: ProvenanceTag::Error, source: source.into(), asof_date, ttl: Duration::ZERO }
    }

    #[must_use]
    pub fn placeholder(source: impl Into<String>, asof_date: NaiveDate) -> Self {
        Self { tag: ProvenanceTag::Placeholder, source: source.into(), asof_date, ttl: Duration::ZERO }
    }
}
