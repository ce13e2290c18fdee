//! Server configuration for HTTP and gRPC endpoints.

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port for REST endpoints (/health, /v1/*).
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// gRPC server port for the pattern execution and capability services.
    #[serde(default = "default_grpc_port")]
    pub grpc_port: u16,
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            grpc_port: default_grpc_port(),
            bind_address: default_bind_address(),
        }
    }
}

pub(crate) const fn default_http_port() -> u16 {
    50051
}

pub(crate) const fn default_grpc_port() -> u16 {
    50053
}

pub(crate) fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
