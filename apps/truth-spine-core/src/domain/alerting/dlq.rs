//! Dead-letter queue job for failed notification deliveries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AlertId, DlqJobId};

/// Lifecycle status of a DLQ job. Moves only `pending -> delivered` or
/// `pending -> failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DlqStatus {
    Pending,
    Delivered,
    Failed,
}

/// Backoff schedule for retry counts 0, 1, 2 — minutes to wait before the
/// next replay attempt is due. After three failed retries the job becomes
/// terminal (`failed`).
const BACKOFF_MINUTES: [i64; 3] = [1, 5, 30];

/// Maximum number of retries before a job is marked `failed`.
pub const MAX_RETRIES: u32 = 3;

/// A failed notification delivery, replayed on the hourly DLQ cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlqJob {
    pub id: DlqJobId,
    pub alert_id: AlertId,
    /// Serialized notification payload, opaque to the DLQ itself.
    pub payload: String,
    pub error: String,
    pub retry_count: u32,
    pub status: DlqStatus,
    pub created_at: DateTime<Utc>,
    pub last_attempted_at: Option<DateTime<Utc>>,
}

impl DlqJob {
    /// Whether this job is due for another replay attempt as of `now`.
    ///
    /// A job that has never been attempted is always due. A terminal job
    /// (`delivered` or `failed`) is never due.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.status != DlqStatus::Pending {
            return false;
        }
        let Some(last) = self.last_attempted_at else {
            return true;
        };
        let Some(&minutes) = BACKOFF_MINUTES.get(self.retry_count as usize) else {
            return false;
        };
        now - last >= Duration::minutes(minutes)
    }

    /// Record a failed replay attempt: increments the retry counter and
    /// transitions to `failed` once [`MAX_RETRIES`] is reached.
    pub fn record_failure(&mut self, error: impl Into<String>, attempted_at: DateTime<Utc>) {
        self.error = error.into();
        self.retry_count += 1;
        self.last_attempted_at = Some(attempted_at);
        if self.retry_count >= MAX_RETRIES {
            self.status = DlqStatus::Failed;
        }
    }

    /// Record a successful replay attempt.
    pub fn record_success(&mut self, attempted_at: DateTime<Utc>) {
        self.status = DlqStatus::Delivered;
        self.last_attempted_at = Some(attempted_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_job() -> DlqJob {
        DlqJob {
            id: DlqJobId::new("dlq-1"),
            alert_id: AlertId::new("alert-1"),
            payload: "{}".to_string(),
            error: "smtp connect failure".to_string(),
            retry_count: 0,
            status: DlqStatus::Pending,
            created_at: Utc::now(),
            last_attempted_at: None,
        }
    }

    #[test]
    fn never_attempted_job_is_always_due() {
        let job = fresh_job();
        assert!(job.is_due(Utc::now()));
    }

    #[test]
    fn recently_attempted_job_is_not_due_until_backoff_elapses() {
        let mut job = fresh_job();
        let now = Utc::now();
        job.record_failure("smtp timeout", now);
        assert!(!job.is_due(now));
        assert!(job.is_due(now + Duration::minutes(1)));
    }

    #[test]
    fn three_consecutive_failures_escalate_to_failed_s5() {
        let mut job = fresh_job();
        let t0 = Utc::now();
        job.record_failure("smtp timeout", t0);
        assert_eq!(job.retry_count, 1);
        assert_eq!(job.status, DlqStatus::Pending);

        job.record_failure("smtp timeout", t0 + Duration::minutes(5));
        assert_eq!(job.retry_count, 2);
        assert_eq!(job.status, DlqStatus::Pending);

        job.record_failure("smtp timeout", t0 + Duration::minutes(35));
        assert_eq!(job.retry_count, 3);
        assert_eq!(job.status, DlqStatus::Failed);
    }

    #[test]
    fn failed_job_is_never_due_again() {
        let mut job = fresh_job();
        let now = Utc::now();
        for _ in 0..3 {
            job.record_failure("err", now);
        }
        assert_eq!(job.status, DlqStatus::Failed);
        assert!(!job.is_due(now + Duration::days(1)));
    }

    #[test]
    fn successful_replay_marks_delivered() {
        let mut job = fresh_job();
        job.record_success(Utc::now());
        assert_eq!(job.status, DlqStatus::Delivered);
        assert!(!job.is_due(Utc::now()));
    }

    #[test]
    fn backoff_schedule_matches_spec_1_5_30_minutes() {
        assert_eq!(BACKOFF_MINUTES, [1, 5, 30]);
        assert_eq!(MAX_RETRIES, 3);
    }
}
