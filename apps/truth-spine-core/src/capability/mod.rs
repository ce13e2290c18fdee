//! Capability runtime: agents register named operations here, the pattern
//! orchestrator routes to them, and this module provides the shared
//! plumbing (caching, retries, provenance) common to every capability call.

mod cache;
mod context;
mod error;
mod provenance;
mod registry;
mod runtime;

pub use context::{ExecutionState, RequestContext};
pub use error::CapabilityError;
pub use provenance::{Provenance, ProvenanceTag};
pub use registry::{Capability, CapabilityRegistry};
pub use runtime::{CapabilityOutcome, CapabilityRuntime};
