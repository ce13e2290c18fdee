//! Pattern orchestrator: executes a declarative DAG of capability
//! invocations and assembles the trace and provenance a client sees.

mod definition;
mod error;
mod executor;
mod template;

pub use definition::{PatternDefinition, PatternStep};
pub use error::PatternError;
pub use executor::PatternExecutor;
pub use template::TemplateError;
