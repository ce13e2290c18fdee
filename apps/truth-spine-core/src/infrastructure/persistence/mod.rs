//! Persistence adapters.
//!
//! Every repository trait is implemented twice: once in-memory for tests and
//! local development, once against Turso for production.

mod in_memory;
mod repository;
mod turso;

pub use in_memory::InMemoryPersistence;
pub use repository::{AlertRepository, MetricsRepository, PersistenceError, PricingPackRepository};
pub use turso::TursoPersistence;
