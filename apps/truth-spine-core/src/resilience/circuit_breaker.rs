//! Per-provider circuit breaker.
//!
//! # State machine
//!
//! ```text
//! Closed --(3 consecutive failures)--> Open
//! Open --(60s elapsed)--> HalfOpen
//! HalfOpen --(probe succeeds)--> Closed
//! HalfOpen --(probe fails)--> Open
//! ```
//!
//! Unlike a sliding-window breaker this one only counts *consecutive*
//! failures — a single success resets the streak to zero.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitBreakerState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected until the cooldown elapses.
    Open,
    /// A single probe call is permitted to decide the next state.
    HalfOpen,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before tripping to `Open`.
    pub failure_threshold: u32,
    /// How long the circuit stays `Open` before allowing a probe.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

struct Inner {
    state: CircuitBreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Whether the single permitted half-open probe has already been handed out.
    probe_in_flight: bool,
}

/// A single provider's circuit breaker. One instance per upstream dependency
/// (a pricing provider, a news feed, and so on).
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: RwLock<Inner>,
}

impl CircuitBreaker {
    /// Create a breaker for `name`, starting `Closed`.
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: RwLock::new(Inner {
                state: CircuitBreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    /// The provider name this breaker guards.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, transitioning `Open` to `HalfOpen` if the cooldown has
    /// elapsed.
    #[must_use]
    pub fn state(&self) -> CircuitBreakerState {
        self.maybe_transition_to_half_open();
        self.inner.read().unwrap().state
    }

    /// Whether a call is allowed right now. In `HalfOpen`, only the first
    /// caller after the cooldown gets to probe; concurrent callers are
    /// rejected until that probe resolves.
    pub fn is_call_permitted(&self) -> bool {
        self.maybe_transition_to_half_open();
        let mut inner = self.inner.write().unwrap();
        match inner.state {
            CircuitBreakerState::Closed => true,
            CircuitBreakerState::Open => false,
            CircuitBreakerState::HalfOpen => {
                if inner.probe_in_flight {
                    false
                } else {
                    inner.probe_in_flight = true;
                    true
                }
            }
        }
    }

    fn maybe_transition_to_half_open(&self) {
        let mut inner = self.inner.write().unwrap();
        if inner.state == CircuitBreakerState::Open
            && inner.opened_at.is_some_and(|t| t.elapsed() >= self.config.cooldown)
        {
            inner.state = CircuitBreakerState::HalfOpen;
            inner.probe_in_flight = false;
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.consecutive_failures = 0;
        inner.probe_in_flight = false;
        inner.state = CircuitBreakerState::Closed;
        inner.opened_at = None;
    }

    /// Record a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.probe_in_flight = false;
        match inner.state {
            CircuitBreakerState::HalfOpen => {
                inner.state = CircuitBreakerState::Open;
                inner.opened_at = Some(Instant::now());
            }
            CircuitBreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = CircuitBreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitBreakerState::Open => {}
        }
    }
}

/// Named set of circuit breakers, one per provider, built at startup.
#[derive(Default)]
pub struct ServiceCircuitBreakers {
    breakers: std::collections::HashMap<String, std::sync::Arc<CircuitBreaker>>,
}

impl ServiceCircuitBreakers {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a breaker under `name`, replacing any existing one.
    pub fn register(&mut self, name: impl Into<String>, config: CircuitBreakerConfig) {
        let name = name.into();
        self.breakers
            .insert(name.clone(), std::sync::Arc::new(CircuitBreaker::new(name, config)));
    }

    /// Fetch the breaker registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<std::sync::Arc<CircuitBreaker>> {
        self.breakers.get(name).cloned()
    }
}
