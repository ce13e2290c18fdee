//! Configuration module for the nightly analytics platform.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for all platform components.
//!
//! # Usage
//!
//! ```rust,ignore
//! use truth_spine_core::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! // Access configuration values
//! println!("gRPC port: {}", config.server.grpc_port);
//! ```

mod alerting;
mod environment;
mod observability;
mod orchestrator;
mod persistence;
mod pricing_pack;
mod resilience;
mod server;
mod validation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use alerting::AlertingConfig;
pub use environment::EnvironmentConfig;
pub use observability::{LoggingConfig, ObservabilityConfig};
pub use orchestrator::OrchestratorConfig;
pub use persistence::{PersistenceConfig, PersistenceConfigError};
pub use pricing_pack::PricingPackConfig;
pub use resilience::{ProviderResilienceSettings, ResilienceConfig};
pub use server::ServerConfig;
pub use validation::{
    StartupValidation, StartupValidationError, require_credentials, validate_startup_environment,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Pricing pack builder configuration.
    #[serde(default)]
    pub pricing_pack: PricingPackConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Provider resilience (rate limit + circuit breaker) configuration.
    #[serde(default)]
    pub resilience: ResilienceConfig,
    /// Turso persistence configuration.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Nightly orchestrator schedule configuration.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Alert evaluation and notification delivery configuration.
    #[serde(default)]
    pub alerting: AlertingConfig,
    /// Deployment environment configuration.
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    // Read the config file
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    // Interpolate environment variables
    let interpolated = interpolate_env_vars(&contents);

    // Parse YAML
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;

    // Validate configuration
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let mut result = input.to_string();

    // Match ${VAR} or ${VAR:-default} patterns
    let re = ENV_VAR_REGEX.get_or_init(|| {
        // This regex pattern is compile-time constant and always valid
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    for cap in re.captures_iter(input) {
        // Group 0 and group 1 are guaranteed by the regex pattern structure
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let Some(var_match) = cap.get(1) else {
            continue;
        };
        let full_match = full_match.as_str();
        let var_name = var_match.as_str();
        let default_value = cap.get(2).map(|m| m.as_str());

        let value = match std::env::var(var_name) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        };

        result = result.replace(full_match, &value);
    }

    result
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Validate server ports (must be different)
    let http = config.server.http_port;
    let grpc = config.server.grpc_port;

    if http == grpc {
        return Err(ConfigError::ValidationError(
            "http_port and grpc_port must be different".to_string(),
        ));
    }

    // Validate orchestrator schedule
    if config.orchestrator.run_hour_utc > 23 {
        return Err(ConfigError::ValidationError(
            "orchestrator.run_hour_utc must be between 0 and 23".to_string(),
        ));
    }
    if config.orchestrator.run_minute_utc > 59 {
        return Err(ConfigError::ValidationError(
            "orchestrator.run_minute_utc must be between 0 and 59".to_string(),
        ));
    }

    // Validate resilience settings
    if config.resilience.default.rate_limit == 0 {
        return Err(ConfigError::ValidationError(
            "resilience.default.rate_limit must be positive".to_string(),
        ));
    }
    if config.resilience.default.failure_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "resilience.default.failure_threshold must be positive".to_string(),
        ));
    }

    // Validate environment mode
    let valid_modes = ["development", "staging", "production"];
    if !valid_modes.contains(&config.environment.mode.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "environment.mode must be one of: {valid_modes:?}"
        )));
    }

    Ok(())
}
