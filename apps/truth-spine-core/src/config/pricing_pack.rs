//! Pricing pack builder configuration.

use serde::{Deserialize, Serialize};

/// Pricing pack builder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPackConfig {
    /// Name of the close-price policy applied when building a pack
    /// (e.g. "last_close_before_cutoff").
    #[serde(default = "default_policy")]
    pub policy: String,
    /// Hour of day (UTC) the prewarm build begins.
    #[serde(default = "default_prewarm_hour_utc")]
    pub prewarm_hour_utc: u32,
    /// Ordered provider priority used when a security has quotes from more
    /// than one source.
    #[serde(default = "default_source_priority")]
    pub source_priority: Vec<String>,
}

impl Default for PricingPackConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            prewarm_hour_utc: default_prewarm_hour_utc(),
            source_priority: default_source_priority(),
        }
    }
}

fn default_policy() -> String {
    "last_close_before_cutoff".to_string()
}

const fn default_prewarm_hour_utc() -> u32 {
    1
}

fn default_source_priority() -> Vec<String> {
    vec!["primary".to_string(), "secondary".to_string()]
}

pub(crate) const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_nightly_prewarm_expectations() {
        let config = PricingPackConfig::default();
        assert_eq!(config.policy, "last_close_before_cutoff");
        assert_eq!(config.prewarm_hour_utc, 1);
        assert_eq!(config.source_priority, vec!["primary", "secondary"]);
    }
}
