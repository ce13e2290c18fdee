//! Infrastructure layer.
//!
//! Adapters implementing the ports the domain and application layers depend
//! on.
//!
//! - `persistence/`: repository implementations (in-memory, Turso)
//! - `config/`: dependency-injection container wiring those repositories and
//!   the provider/resilience ports together at startup
//! - `ledger_file/`: file-based `LedgerPort` adapter for local runs

pub mod config;
pub mod ledger_file;
pub mod persistence;
