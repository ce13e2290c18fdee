//! Nightly orchestrator schedule configuration.

use serde::{Deserialize, Serialize};

/// Nightly orchestrator scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hour of day (UTC) the nightly sacred-order pipeline starts.
    #[serde(default = "default_run_hour_utc")]
    pub run_hour_utc: u32,
    /// Minute of hour (UTC) the nightly pipeline starts.
    #[serde(default = "default_run_minute_utc")]
    pub run_minute_utc: u32,
    /// Cadence, in minutes, at which the DLQ replay step runs independently
    /// of the nightly pipeline.
    #[serde(default = "default_dlq_replay_interval_minutes")]
    pub dlq_replay_interval_minutes: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            run_hour_utc: default_run_hour_utc(),
            run_minute_utc: default_run_minute_utc(),
            dlq_replay_interval_minutes: default_dlq_replay_interval_minutes(),
        }
    }
}

const fn default_run_hour_utc() -> u32 {
    2
}

const fn default_run_minute_utc() -> u32 {
    0
}

const fn default_dlq_replay_interval_minutes() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dlq_replay_defaults_to_hourly_cadence() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.dlq_replay_interval_minutes, 60);
    }
}
