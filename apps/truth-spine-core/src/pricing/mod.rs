//! The nightly pricing pack pipeline: provider abstraction and the builder
//! that turns provider quotes into an immutable, content-addressed pack.
//!
//! - `provider`: the `PriceProvider`/`FxProvider` ports and their HTTP
//!   adapters
//! - `builder`: `PricingPackBuilder`, the idempotent `build`/`mark_fresh`
//!   entry points the orchestrator drives

mod builder;
mod provider;

pub use builder::{BuilderError, PricingPackBuilder};
pub use provider::{FxProvider, FxQuote, HttpFxProvider, HttpPriceProvider, PriceProvider, PriceQuote, ProviderError};
