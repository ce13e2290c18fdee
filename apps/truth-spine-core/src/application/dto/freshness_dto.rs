//! Freshness gate status, as handed back to a caller deciding whether to
//! wait or serve stale data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::pricing_pack::PackStatus;
use crate::domain::shared::PackId;

/// The servability of the latest pricing pack for one `(asof_date, policy)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshnessStatusDto {
    pub pack_id: PackId,
    pub asof_date: NaiveDate,
    pub status: PackStatus,
    pub is_servable: bool,
    /// Set when `status` is not `fresh`: an estimate of when it will be.
    pub estimated_ready: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warming_pack_is_not_servable() {
        let dto = FreshnessStatusDto {
            pack_id: PackId::new("pack-1"),
            asof_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            status: PackStatus::Warming,
            is_servable: PackStatus::Warming.is_servable(),
            estimated_ready: Some(Utc::now()),
        };
        assert!(!dto.is_servable);
    }
}
