//! Alert evaluation and notification delivery configuration.

use serde::{Deserialize, Serialize};

/// Alerting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// Default cooldown, in hours, applied to alerts that don't set one.
    #[serde(default = "default_cooldown_hours")]
    pub default_cooldown_hours: i64,
    /// Maximum DLQ replay attempts before a job is marked `failed`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            default_cooldown_hours: default_cooldown_hours(),
            max_retries: default_max_retries(),
        }
    }
}

const fn default_cooldown_hours() -> i64 {
    24
}

const fn default_max_retries() -> u32 {
    3
}
