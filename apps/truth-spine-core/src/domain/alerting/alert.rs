//! Alert rule aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::notification::DeliveryChannel;
use crate::domain::shared::AlertId;

/// A user-owned alert: a condition, its delivery channels, a cooldown, and
/// the last time it fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub user_id: String,
    pub condition: Condition,
    pub channels: Vec<DeliveryChannel>,
    pub cooldown_hours: i64,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Alert {
    /// Whether the cooldown has elapsed as of `now`.
    ///
    /// An alert with no delivered history (`last_fired_at = None`) always
    /// passes cooldown — it fires once if its condition is satisfied.
    #[must_use]
    pub fn cooldown_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now - last >= chrono::Duration::hours(self.cooldown_hours),
        }
    }
}
