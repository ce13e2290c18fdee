//! Capability runtime errors.

use thiserror::Error;

/// Errors from registration or dispatch.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    /// No capability registered under this name.
    #[error("unknown capability: {0}")]
    Unknown(String),
    /// Two agents tried to register the same capability name.
    #[error("capability {0} is already registered")]
    DuplicateRegistration(String),
    /// The capability rejected its arguments.
    #[error("invalid arguments for {capability}: {message}")]
    InvalidArguments { capability: String, message: String },
    /// The underlying provider or database call failed.
    #[error("{capability} failed: {message}")]
    Upstream { capability: String, message: String },
}
