//! Hourly DLQ replay: pops jobs due for retry, attempts redelivery, and
//! records the outcome.
//!
//! Grounded on `original_source/backend/jobs/alert_retry_worker.py`'s
//! replay loop; the 1/5/30-minute, max-3-retry schedule itself lives on
//! [`crate::domain::alerting::DlqJob`] and is spec-authoritative (noted in
//! DESIGN.md as superseding the Python prototype's 5-step schedule).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::channel::NotificationChannelPort;
use crate::domain::alerting::{DeliveryChannel, Notification};
use crate::infrastructure::persistence::{AlertRepository, PersistenceError};

/// Replays due DLQ jobs against the registered delivery channels.
pub struct DlqReplayer {
    repo: Arc<dyn AlertRepository>,
    channels: HashMap<DeliveryChannel, Arc<dyn NotificationChannelPort>>,
}

impl DlqReplayer {
    #[must_use]
    pub fn new(repo: Arc<dyn AlertRepository>, channels: Vec<Arc<dyn NotificationChannelPort>>) -> Self {
        Self {
            repo,
            channels: channels.into_iter().map(|c| (c.channel(), c)).collect(),
        }
    }

    /// Replay every job due as of now. Returns `(delivered, still_pending_or_failed)`.
    pub async fn replay_due(&self) -> Result<(usize, usize), PersistenceError> {
        let now = Utc::now();
        let due = self.repo.due_dlq_jobs(now).await?;
        let mut delivered = 0usize;
        let mut other = 0usize;

        for mut job in due {
            let notification: Option<Notification> = serde_json::from_str(&job.payload).ok();
            let Some(notification) = notification else {
                warn!(job_id = %job.id, "DLQ job payload is not a valid notification, marking failed");
                job.record_failure("unparseable payload", now);
                self.repo.update_dlq(job).await?;
                other += 1;
                continue;
            };

            match self.channels.get(&notification.channel) {
                Some(port) => match port.deliver(&notification).await {
                    Ok(()) => {
                        job.record_success(now);
                        info!(job_id = %job.id, "DLQ replay delivered");
                        delivered += 1;
                    }
                    Err(err) => {
                        job.record_failure(err.to_string(), now);
                        other += 1;
                    }
                },
                None => {
                    job.record_failure("no port registered for channel", now);
                    other += 1;
                }
            }
            self.repo.update_dlq(job).await?;
        }

        Ok((delivered, other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::channel::InAppChannel;
    use crate::domain::alerting::{DlqJob, DlqStatus};
    use crate::domain::shared::{AlertId, DlqJobId, NotificationId};
    use crate::infrastructure::persistence::InMemoryPersistence;
    use chrono::NaiveDate;

    fn notification() -> Notification {
        Notification {
            id: NotificationId::new("n1"),
            user_id: "user-1".to_string(),
            alert_id: AlertId::new("alert-1"),
            day_of_delivery: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            channel: DeliveryChannel::InApp,
            message: "AAPL crossed $200".to_string(),
            delivered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn due_job_with_valid_channel_is_delivered() {
        let store = Arc::new(InMemoryPersistence::new());
        let job = DlqJob {
            id: DlqJobId::new("dlq-1"),
            alert_id: AlertId::new("alert-1"),
            payload: serde_json::to_string(&notification()).unwrap(),
            error: "smtp timeout".to_string(),
            retry_count: 0,
            status: DlqStatus::Pending,
            created_at: Utc::now(),
            last_attempted_at: None,
        };
        store.enqueue_dlq(job).await.unwrap();

        let in_app = Arc::new(InAppChannel::default());
        let replayer = DlqReplayer::new(store, vec![in_app.clone()]);
        let (delivered, other) = replayer.replay_due().await.unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(other, 0);
    }

    #[tokio::test]
    async fn job_with_no_matching_channel_is_marked_failed_path() {
        let store = Arc::new(InMemoryPersistence::new());
        let job = DlqJob {
            id: DlqJobId::new("dlq-1"),
            alert_id: AlertId::new("alert-1"),
            payload: serde_json::to_string(&notification()).unwrap(),
            error: "smtp timeout".to_string(),
            retry_count: 0,
            status: DlqStatus::Pending,
            created_at: Utc::now(),
            last_attempted_at: None,
        };
        store.enqueue_dlq(job).await.unwrap();

        let replayer = DlqReplayer::new(store, vec![]);
        let (delivered, other) = replayer.replay_due().await.unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(other, 1);
    }
}
