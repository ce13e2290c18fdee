//! Provider resilience configuration: rate limiting and circuit breaking.

use serde::{Deserialize, Serialize};

/// Per-provider resilience configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Default settings applied to any provider without an override.
    #[serde(default)]
    pub default: ProviderResilienceSettings,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            default: ProviderResilienceSettings::default(),
        }
    }
}

/// Token-bucket rate limit plus circuit breaker settings for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResilienceSettings {
    /// Requests permitted per `rate_limit_window_secs`.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    /// Token bucket refill window, in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    /// Consecutive failures before the breaker opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before a single half-open probe.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Base backoff delay, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Backoff delay cap, in milliseconds.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
}

impl Default for ProviderResilienceSettings {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
        }
    }
}

const fn default_rate_limit() -> u32 {
    60
}

const fn default_rate_limit_window_secs() -> u64 {
    60
}

const fn default_failure_threshold() -> u32 {
    3
}

const fn default_cooldown_secs() -> u64 {
    60
}

const fn default_backoff_base_ms() -> u64 {
    1_000
}

const fn default_backoff_cap_ms() -> u64 {
    60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_three_failures_sixty_second_cooldown() {
        let settings = ProviderResilienceSettings::default();
        assert_eq!(settings.failure_threshold, 3);
        assert_eq!(settings.cooldown_secs, 60);
        assert_eq!(settings.backoff_base_ms, 1_000);
        assert_eq!(settings.backoff_cap_ms, 60_000);
    }
}
