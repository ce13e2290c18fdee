//! Resilience patterns for provider calls: circuit breaking, rate limiting,
//! and retry backoff.

mod backoff;
mod circuit_breaker;
mod token_bucket;

pub use backoff::delay_for_attempt;
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerState, ServiceCircuitBreakers,
};
pub use token_bucket::TokenBucket;
