//! Pattern execution errors.

use thiserror::Error;

use super::template::TemplateError;
use crate::capability::CapabilityError;

#[derive(Debug, Error, Clone)]
pub enum PatternError {
    #[error("step {step}: {source}")]
    Template { step: String, #[source] source: TemplateError },
    #[error("step {step}: {source}")]
    Capability { step: String, #[source] source: CapabilityError },
}
