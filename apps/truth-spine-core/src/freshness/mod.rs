//! The freshness gate: the single read-through check every request-serving
//! path consults before dispatching a pattern.
//!
//! Grounded on `original_source/backend/jobs/pricing_pack.py`'s
//! `is_pack_fresh`/`get_pack_health` pair, folded into one read since this
//! core has no separate health endpoint surface (spec.md §1 non-goal).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{NaiveDate, Utc};

use crate::application::dto::FreshnessStatusDto;
use crate::domain::pricing_pack::PackStatus;
use crate::infrastructure::persistence::{PersistenceError, PricingPackRepository};

/// How far past the configured prewarm hour a warming pack is assumed to
/// need before it becomes fresh, used only to populate `estimated_ready`
/// when no better signal exists.
const DEFAULT_ESTIMATED_WAIT: StdDuration = StdDuration::from_secs(15 * 60);

/// Reads the current freshness of the pricing pack a request would be
/// pinned to.
pub struct FreshnessGate {
    repo: Arc<dyn PricingPackRepository>,
}

impl FreshnessGate {
    #[must_use]
    pub fn new(repo: Arc<dyn PricingPackRepository>) -> Self {
        Self { repo }
    }

    /// The freshness status for the latest pack matching `(asof_date,
    /// policy)`. `Ok(None)` if no pack has been built yet at all.
    pub async fn check(&self, asof_date: NaiveDate, policy: &str) -> Result<Option<FreshnessStatusDto>, PersistenceError> {
        let Some(pack) = self.latest_pack(asof_date, policy).await? else {
            return Ok(None);
        };
        let is_servable = pack.status.is_servable();
        Ok(Some(FreshnessStatusDto {
            pack_id: pack.id,
            asof_date: pack.asof_date,
            status: pack.status,
            is_servable,
            estimated_ready: (!is_servable).then(|| Utc::now() + chrono::Duration::from_std(DEFAULT_ESTIMATED_WAIT).unwrap_or_default()),
        }))
    }

    /// Convenience for callers that only need the yes/no answer.
    pub async fn is_servable(&self, asof_date: NaiveDate, policy: &str) -> Result<bool, PersistenceError> {
        Ok(self.latest_pack(asof_date, policy).await?.is_some_and(|pack| pack.status.is_servable()))
    }

    async fn latest_pack(&self, asof_date: NaiveDate, policy: &str) -> Result<Option<crate::domain::pricing_pack::Pack>, PersistenceError> {
        self.repo.latest_any(asof_date, policy).await
    }
}
