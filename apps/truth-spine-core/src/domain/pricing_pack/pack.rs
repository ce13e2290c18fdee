//! The pricing pack aggregate itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::PackId;

/// Lifecycle state of a pricing pack.
///
/// `warming` is the state immediately after insertion; only the orchestrator's
/// `mark_fresh` step (after reconciliation and pre-warm) advances it to
/// `fresh`. `error` is reserved for packs the builder could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackStatus {
    /// Inserted but not yet promoted by the orchestrator.
    Warming,
    /// Promoted; visible to the freshness gate and online executor.
    Fresh,
    /// The builder could not produce a usable pack.
    Error,
}

impl PackStatus {
    /// Whether a pack in this status may be served to clients.
    #[must_use]
    pub const fn is_servable(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Names of the providers consulted while building a pack, kept separately
/// from the price/FX rows themselves so the pack can report its sourcing at
/// a glance without a join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesManifest {
    /// Provider names consulted for security closes, in the order tried.
    pub prices: Vec<String>,
    /// Provider names consulted for FX rates, in the order tried.
    pub fx: Vec<String>,
}

impl SourcesManifest {
    /// An empty manifest, extended as the builder consults providers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a provider used for a price fetch, if not already recorded.
    pub fn record_price_source(&mut self, source: impl Into<String>) {
        let source = source.into();
        if !self.prices.contains(&source) {
            self.prices.push(source);
        }
    }

    /// Record a provider used for an FX fetch, if not already recorded.
    pub fn record_fx_source(&mut self, source: impl Into<String>) {
        let source = source.into();
        if !self.fx.contains(&source) {
            self.fx.push(source);
        }
    }
}

/// An immutable, content-addressed snapshot of closing prices and FX rates
/// for one `(asof_date, policy)` key.
///
/// A pack is never mutated after insertion other than the
/// `warming -> fresh` status transition and the one-shot `superseded_by`
/// pointer. Two non-superseded packs never share a `(asof_date, policy)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    /// Generated identifier.
    pub id: PackId,
    /// The date this pack's prices and rates are as-of.
    pub asof_date: NaiveDate,
    /// Pricing convention tag, e.g. "4pm_fixing_usd".
    pub policy: String,
    /// Content hash over the sorted price and FX tuples.
    pub hash: String,
    /// Lifecycle status.
    pub status: PackStatus,
    /// Whether the non-blocking pre-warm steps have completed for this pack.
    pub prewarm_done: bool,
    /// One-shot pointer to the pack that superseded this one, if restated.
    pub superseded_by: Option<PackId>,
    /// Providers consulted while building this pack.
    pub sources: SourcesManifest,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pack {
    /// Whether this pack has been superseded by a later restatement.
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        self.superseded_by.is_some()
    }

    /// Whether this pack is the latest, servable snapshot for its key.
    #[must_use]
    pub const fn is_fresh_and_current(&self) -> bool {
        self.status.is_servable() && !self.is_superseded()
    }
}
