//! Jittered exponential backoff for provider retries.

use std::time::Duration;

use rand::Rng;

const BASE: Duration = Duration::from_secs(1);
const CAP: Duration = Duration::from_secs(60);
const JITTER_FRACTION: f64 = 0.2;

/// Delay before retry attempt `attempt` (0-indexed): `base * 2^attempt`,
/// capped at 60s, with +/-20% jitter to avoid thundering-herd retries across
/// providers.
#[must_use]
pub fn delay_for_attempt(attempt: u32) -> Duration {
    let exp = BASE.as_secs_f64() * 2f64.powi(attempt.min(16) as i32);
    let capped = exp.min(CAP.as_secs_f64());
    let jitter = rand::rng().random_range(-JITTER_FRACTION..=JITTER_FRACTION);
    let jittered = (capped * (1.0 + jitter)).max(0.0);
    Duration::from_secs_f64(jittered)
}
