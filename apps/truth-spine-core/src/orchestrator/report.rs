//! The nightly run report: one row per step plus the overall outcome.
//!
//! Grounded on `original_source/DawsOSP/backend/jobs/scheduler.py`'s
//! `JobResult`/`NightlyRunReport` shape.

use chrono::{DateTime, NaiveDate, Utc};

/// The outcome of a single sacred-order step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: &'static str,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl StepReport {
    #[must_use]
    pub const fn ok(name: &'static str, duration_ms: u64) -> Self {
        Self {
            name,
            success: true,
            duration_ms,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(name: &'static str, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            name,
            success: false,
            duration_ms,
            error: Some(error.into()),
        }
    }
}

/// The full nightly pipeline outcome.
#[derive(Debug, Clone)]
pub struct NightlyRunReport {
    pub run_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// `false` if any blocking step failed.
    pub success: bool,
    /// The name of the blocking step that stopped the pipeline, if any.
    pub blocked_at: Option<&'static str>,
    pub steps: Vec<StepReport>,
}

impl NightlyRunReport {
    /// Process exit code for the nightly entry point: 0 on success, 1 on any
    /// blocker failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.success { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_reflects_success() {
        let report = NightlyRunReport {
            run_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            duration_ms: 10,
            success: false,
            blocked_at: Some("reconcile_ledger"),
            steps: vec![],
        };
        assert_eq!(report.exit_code(), 1);
    }
}
