//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Events**: Records of state transitions
//! - **Domain Services**: Stateless business logic
//! - **Repository Traits**: Persistence abstractions (implemented in adapters)
//!
//! # Bounded Contexts
//!
//! - [`pricing_pack`]: Nightly pricing pack, prices, FX rates, supersede chain
//! - [`ledger`]: Portfolios, lots, transactions, cash flows reconciled against a pack
//! - [`metrics`]: Daily portfolio values, performance and attribution results
//! - [`alerting`]: Alert rules, notifications and dead-letter jobs

pub mod alerting;
pub mod ledger;
pub mod metrics;
pub mod pricing_pack;
pub mod shared;
