//! Environment validation at startup.

/// Errors from environment validation at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupValidationError {
    /// Missing required provider credentials for the deployment mode.
    #[error("Missing required credentials for {environment} mode: {details}")]
    MissingCredentials {
        /// The deployment mode.
        environment: String,
        /// Details about which credentials are missing.
        details: String,
    },
}

/// Result of startup environment validation.
#[derive(Debug)]
pub struct StartupValidation {
    /// Whether validation passed.
    pub valid: bool,
    /// Warning messages (non-fatal).
    pub warnings: Vec<String>,
}

impl StartupValidation {
    /// Create a successful validation result.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
        }
    }

    /// Create a successful validation with warnings.
    #[must_use]
    pub const fn ok_with_warnings(warnings: Vec<String>) -> Self {
        Self {
            valid: true,
            warnings,
        }
    }
}

/// Validate that required provider credentials are present for the given
/// deployment mode. "development" runs without credentials (stubbed
/// providers); "staging" and "production" require them.
///
/// # Errors
///
/// Returns `StartupValidationError` if required credentials are missing
/// outside development mode.
pub fn validate_startup_environment(
    mode: &str,
    provider_api_key: &str,
) -> Result<StartupValidation, StartupValidationError> {
    if mode.eq_ignore_ascii_case("development") {
        let mut warnings = Vec::new();
        if !provider_api_key.is_empty() {
            warnings.push(
                "Provider credentials configured but not required in development mode"
                    .to_string(),
            );
        }
        return Ok(StartupValidation::ok_with_warnings(warnings));
    }

    if provider_api_key.is_empty() {
        return Err(StartupValidationError::MissingCredentials {
            environment: mode.to_string(),
            details:
                "Required environment variable not set: PROVIDER_API_KEY. Set this in your environment or config.yaml."
                    .to_string(),
        });
    }

    Ok(StartupValidation::ok())
}

/// Require a non-empty provider API key, returning a detailed error message.
///
/// # Errors
///
/// Returns an error string if the key is missing and required.
pub fn require_credentials(provider_api_key: &str, mode: &str) -> Result<(), String> {
    if mode.eq_ignore_ascii_case("development") {
        return Ok(());
    }

    if provider_api_key.is_empty() {
        return Err(format!(
            "Provider credentials required for {mode} mode.\n\n\
             Missing:\n  - PROVIDER_API_KEY\n\n\
             To fix:\n\
             1. Set the PROVIDER_API_KEY environment variable, or\n\
             2. Configure it in config.yaml"
        ));
    }

    Ok(())
}
