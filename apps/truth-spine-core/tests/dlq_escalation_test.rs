//! S5. A notification that fails delivery on every attempt escalates
//! through the DLQ's 1/5/30-minute backoff to `failed` after three
//! retries, never advancing the alert's cooldown clock, and the per-day
//! dedup key still allows the alert to fire again the next day.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use truth_spine_core::{
    Alert, AlertEvaluator, AlertRepository, Condition, ComparisonOperator, DeliveryChannel,
    DeliveryError, DlqReplayer, DlqStatus, InMemoryPersistence, NotificationChannelPort,
    ObservedValueSource,
};

/// A channel double that fails every delivery, so every fired alert is
/// routed to the DLQ instead of recorded as delivered.
#[derive(Debug, Default)]
struct AlwaysFailChannel {
    attempts: std::sync::Mutex<u32>,
}

#[async_trait]
impl NotificationChannelPort for AlwaysFailChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn deliver(&self, _notification: &truth_spine_core::Notification) -> Result<(), DeliveryError> {
        *self.attempts.lock().unwrap() += 1;
        Err(DeliveryError { channel: DeliveryChannel::Email, message: "smtp connect refused".to_string() })
    }
}

struct FixedSource(Decimal);

#[async_trait]
impl ObservedValueSource for FixedSource {
    async fn observed_value(&self, _condition: &Condition, _user_id: &str, _asof_date: NaiveDate) -> Option<Decimal> {
        Some(self.0)
    }
}

fn alert() -> Alert {
    Alert {
        id: truth_spine_core::AlertId::new("alert-1"),
        user_id: "user-1".to_string(),
        condition: Condition::Price {
            security_id: "AAPL".to_string(),
            operator: ComparisonOperator::GreaterThan,
            threshold: dec!(190.0),
        },
        channels: vec![DeliveryChannel::Email],
        cooldown_hours: 24,
        last_fired_at: None,
        is_active: true,
    }
}

/// Re-queues the one pending DLQ job's `last_attempted_at` far enough into
/// the past that it is due again immediately, standing in for the wall
/// clock advancing past the 1/5/30-minute backoff window between retries.
async fn force_due(repo: &InMemoryPersistence, minutes_ago: i64) {
    let due = repo.due_dlq_jobs(Utc::now() + Duration::hours(1)).await.unwrap();
    assert_eq!(due.len(), 1, "expected exactly one pending DLQ job");
    let mut job = due.into_iter().next().unwrap();
    job.last_attempted_at = Some(Utc::now() - Duration::minutes(minutes_ago));
    repo.update_dlq(job).await.unwrap();
}

#[tokio::test]
async fn s5_three_consecutive_failures_escalate_to_failed_without_advancing_cooldown() {
    let store = Arc::new(InMemoryPersistence::new());
    store.add_alert(alert());

    let channel = Arc::new(AlwaysFailChannel::default());
    let evaluator = AlertEvaluator::new(store.clone(), Arc::new(FixedSource(dec!(200.0))), vec![channel.clone()]);
    let replayer = DlqReplayer::new(store.clone(), vec![channel.clone()]);

    let day1 = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();

    let fired = evaluator.evaluate_all(day1).await.unwrap();
    assert_eq!(fired, 0, "delivery fails, so nothing counts as fired");

    let pending = store.due_dlq_jobs(Utc::now() + Duration::hours(1)).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, DlqStatus::Pending);
    assert_eq!(pending[0].retry_count, 0);

    // Same-day re-evaluation does not enqueue a second DLQ job: the
    // notification dedup key already exists for (user, alert, day).
    let fired_again = evaluator.evaluate_all(day1).await.unwrap();
    assert_eq!(fired_again, 0);
    let still_one = store.due_dlq_jobs(Utc::now() + Duration::hours(1)).await.unwrap();
    assert_eq!(still_one.len(), 1);

    // Retry 1 of 3: due immediately (never attempted).
    let (delivered, other) = replayer.replay_due().await.unwrap();
    assert_eq!((delivered, other), (0, 1));

    // Retry 2 of 3: due once >= 1 minute has elapsed since the first attempt.
    force_due(&store, 2).await;
    let (delivered, other) = replayer.replay_due().await.unwrap();
    assert_eq!((delivered, other), (0, 1));

    // Retry 3 of 3: due once >= 5 minutes have elapsed since the second.
    force_due(&store, 6).await;
    let (delivered, other) = replayer.replay_due().await.unwrap();
    assert_eq!((delivered, other), (0, 1));

    assert_eq!(*channel.attempts.lock().unwrap(), 3);

    // The job has escalated out of Pending, so it no longer shows up as due.
    let pending_after = store.due_dlq_jobs(Utc::now() + Duration::hours(1)).await.unwrap();
    assert!(pending_after.is_empty());

    // The alert's cooldown was never started: no delivery ever succeeded.
    let alerts = store.active_alerts().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].last_fired_at.is_none());

    // A later day is a fresh dedup key: the alert can fire (and fail) again.
    let day2 = day1 + Duration::days(1);
    let fired_day2 = evaluator.evaluate_all(day2).await.unwrap();
    assert_eq!(fired_day2, 0);
    let pending_day2 = store.due_dlq_jobs(Utc::now() + Duration::hours(1)).await.unwrap();
    assert_eq!(pending_day2.len(), 1, "the next day's failed delivery enqueues its own DLQ job");
}
