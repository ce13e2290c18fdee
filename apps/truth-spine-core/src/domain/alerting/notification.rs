//! Delivered (or pending) notifications.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AlertId, NotificationId};

/// A channel a notification can be delivered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    InApp,
    Email,
}

/// A notification, unique per `(user, alert, day-of-delivery)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: String,
    pub alert_id: AlertId,
    pub day_of_delivery: NaiveDate,
    pub channel: DeliveryChannel,
    pub message: String,
    pub delivered_at: DateTime<Utc>,
}

impl Notification {
    /// The unique-constraint key for dedup: `(user, alert, day)`.
    #[must_use]
    pub fn dedup_key(&self) -> (String, AlertId, NaiveDate) {
        (self.user_id.clone(), self.alert_id.clone(), self.day_of_delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_ignores_channel_and_message() {
        let base = Notification {
            id: NotificationId::new("notif-1"),
            user_id: "user-1".to_string(),
            alert_id: AlertId::new("alert-1"),
            day_of_delivery: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            channel: DeliveryChannel::InApp,
            message: "AAPL crossed $200".to_string(),
            delivered_at: Utc::now(),
        };
        let other_channel = Notification {
            id: NotificationId::new("notif-2"),
            channel: DeliveryChannel::Email,
            message: "different text".to_string(),
            ..base.clone()
        };
        assert_eq!(base.dedup_key(), other_channel.dedup_key());
    }

    #[test]
    fn different_day_has_different_dedup_key() {
        let base = Notification {
            id: NotificationId::new("notif-1"),
            user_id: "user-1".to_string(),
            alert_id: AlertId::new("alert-1"),
            day_of_delivery: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            channel: DeliveryChannel::InApp,
            message: "msg".to_string(),
            delivered_at: Utc::now(),
        };
        let next_day = Notification {
            day_of_delivery: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            ..base.clone()
        };
        assert_ne!(base.dedup_key(), next_day.dedup_key());
    }
}
