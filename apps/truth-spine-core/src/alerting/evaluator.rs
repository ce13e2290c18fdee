//! Alert evaluation: read the current value, apply the operator, check
//! cooldown, compose a message, attempt delivery.
//!
//! Grounded on `original_source/backend/app/services/alerts.py`'s
//! evaluate-all-active-alerts loop and `alert_validators.py`'s vocabulary
//! validation (already implemented on [`crate::domain::alerting::Condition`]).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::channel::NotificationChannelPort;
use crate::domain::alerting::{Condition, DeliveryChannel, DlqJob, DlqStatus, Notification};
use crate::domain::shared::{AlertId, DlqJobId, NotificationId};
use crate::infrastructure::persistence::{AlertRepository, PersistenceError};
use crate::observability;

/// Reads the current observed value for a condition. One adapter, not one
/// per condition kind: dispatch on `Condition`'s variant is the adapter's
/// job, matching the single "read the current value" step in the
/// evaluation algorithm.
#[async_trait]
pub trait ObservedValueSource: Send + Sync {
    /// The current value for `condition`, scoped to `user_id`, as of
    /// `asof_date`. `None` if no data exists yet (the alert is skipped,
    /// not failed).
    async fn observed_value(&self, condition: &Condition, user_id: &str, asof_date: NaiveDate) -> Option<Decimal>;
}

/// Composes the human-readable message for a fired alert.
fn compose_message(condition: &Condition, observed: Decimal) -> String {
    match condition {
        Condition::Macro { series_name, .. } => format!("{series_name} is now {observed}"),
        Condition::Metric { metric_name, .. } => format!("{metric_name} is now {observed}"),
        Condition::Rating { rating_name, .. } => format!("{rating_name} is now {observed}"),
        Condition::Price { security_id, .. } => format!("{security_id} price is now {observed}"),
        Condition::NewsSentiment { security_id, .. } => format!("{security_id} sentiment is now {observed}"),
    }
}

/// Evaluates active alerts and drives notification delivery.
pub struct AlertEvaluator {
    repo: Arc<dyn AlertRepository>,
    values: Arc<dyn ObservedValueSource>,
    channels: HashMap<DeliveryChannel, Arc<dyn NotificationChannelPort>>,
}

impl AlertEvaluator {
    #[must_use]
    pub fn new(
        repo: Arc<dyn AlertRepository>,
        values: Arc<dyn ObservedValueSource>,
        channels: Vec<Arc<dyn NotificationChannelPort>>,
    ) -> Self {
        Self {
            repo,
            values,
            channels: channels.into_iter().map(|c| (c.channel(), c)).collect(),
        }
    }

    /// Evaluate every active alert as of `asof_date`. Returns the number of
    /// notifications newly delivered (excluding dedup no-ops).
    pub async fn evaluate_all(&self, asof_date: NaiveDate) -> Result<usize, PersistenceError> {
        let now = Utc::now();
        let alerts = self.repo.active_alerts().await?;
        let mut fired = 0usize;

        for alert in alerts {
            let Some(observed) = self.values.observed_value(&alert.condition, &alert.user_id, asof_date).await else {
                continue;
            };
            if !alert.condition.is_satisfied_by(observed) {
                observability::record_alert_evaluation("not_fired");
                continue;
            }
            if !alert.cooldown_elapsed(now) {
                observability::record_alert_evaluation("cooldown");
                continue;
            }

            let message = compose_message(&alert.condition, observed);
            let delivered = self.deliver_to_all_channels(&alert.id, &alert.user_id, &alert.channels, asof_date, &message, now).await;
            if delivered {
                fired += 1;
                observability::record_alert_evaluation("fired");
                self.repo.record_fire(&alert.id, now).await?;
            } else {
                observability::record_alert_evaluation("fired_undelivered");
            }
        }

        Ok(fired)
    }

    async fn deliver_to_all_channels(
        &self,
        alert_id: &AlertId,
        user_id: &str,
        channels: &[DeliveryChannel],
        day_of_delivery: NaiveDate,
        message: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let mut any_delivered = false;
        for channel in channels {
            let notification = Notification {
                id: NotificationId::generate(),
                user_id: user_id.to_string(),
                alert_id: alert_id.clone(),
                day_of_delivery,
                channel: *channel,
                message: message.to_string(),
                delivered_at: now,
            };

            let inserted = match self.repo.insert_notification(notification.clone()).await {
                Ok(inserted) => inserted,
                Err(err) => {
                    warn!(%alert_id, error = %err, "failed to record notification, skipping delivery");
                    continue;
                }
            };
            if !inserted {
                // Already delivered today for this (user, alert) pair: silent no-op.
                continue;
            }

            let channel_name = match channel {
                DeliveryChannel::InApp => "in_app",
                DeliveryChannel::Email => "email",
            };
            match self.channels.get(channel) {
                Some(port) => match port.deliver(&notification).await {
                    Ok(()) => {
                        observability::record_notification_delivery(channel_name, "delivered");
                        any_delivered = true;
                    }
                    Err(err) => {
                        observability::record_notification_delivery(channel_name, "failed");
                        info!(%alert_id, ?channel, error = %err, "delivery failed, enqueuing to DLQ");
                        self.enqueue_dlq(alert_id, &notification, &err.to_string()).await;
                    }
                },
                None => warn!(?channel, "no port registered for channel, dropping delivery"),
            }
        }
        any_delivered
    }

    async fn enqueue_dlq(&self, alert_id: &AlertId, notification: &Notification, error: &str) {
        let payload = serde_json::to_string(notification).unwrap_or_default();
        let job = DlqJob {
            id: DlqJobId::generate(),
            alert_id: alert_id.clone(),
            payload,
            error: error.to_string(),
            retry_count: 0,
            status: DlqStatus::Pending,
            created_at: Utc::now(),
            last_attempted_at: None,
        };
        if let Err(err) = self.repo.enqueue_dlq(job).await {
            warn!(%alert_id, error = %err, "failed to enqueue DLQ job");
        }
    }
}
