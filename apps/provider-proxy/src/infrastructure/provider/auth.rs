//! Provider WebSocket Authentication
//!
//! Handles authentication with the upstream provider WebSocket feeds.
//! All three feeds (price, macro, news sentiment) share one auth flow and
//! require authentication within 10 seconds of connection establishment.
//!
//! # Authentication Flow
//!
//! 1. Connect to WebSocket endpoint
//! 2. Send `{"action":"auth","key":"...","secret":"..."}`
//! 3. Receive `{"type":"success","msg":"authenticated"}` or an error
//!
//! # Error Codes
//!
//! - 401: Not authenticated
//! - 402: Authentication failed (invalid credentials)
//! - 403: Already authenticated
//! - 404: Authentication timeout (>10 seconds)
//! - 405: Connection limit exceeded

use std::time::Duration;

use thiserror::Error;

use super::messages::{AuthRequest, ErrorMessage, SuccessKind, SuccessMessage};

// =============================================================================
// Constants
// =============================================================================

/// Maximum time allowed for authentication after connection.
/// Providers terminate connections that don't authenticate within 10 seconds.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Recommended time to complete authentication (with safety margin).
pub const AUTH_TIMEOUT_SAFE: Duration = Duration::from_secs(8);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during authentication.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Not authenticated (must authenticate before subscribing).
    #[error("not authenticated: must authenticate before making requests")]
    NotAuthenticated,

    /// Authentication failed (invalid credentials).
    #[error("authentication failed: invalid API key or secret")]
    InvalidCredentials,

    /// Already authenticated (connection was already authenticated).
    #[error("already authenticated: connection is already authenticated")]
    AlreadyAuthenticated,

    /// Authentication timeout (took longer than 10 seconds).
    #[error("authentication timeout: must authenticate within 10 seconds")]
    Timeout,

    /// Connection limit exceeded.
    #[error("connection limit exceeded: too many concurrent connections")]
    ConnectionLimitExceeded,

    /// Invalid message format received.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Unexpected error from server.
    #[error("server error ({code}): {message}")]
    ServerError {
        /// Error code from server
        code: i32,
        /// Error message from server
        message: String,
    },
}

impl From<&ErrorMessage> for AuthError {
    fn from(err: &ErrorMessage) -> Self {
        match err.code {
            401 => Self::NotAuthenticated,
            402 => Self::InvalidCredentials,
            403 => Self::AlreadyAuthenticated,
            404 => Self::Timeout,
            405 => Self::ConnectionLimitExceeded,
            code => Self::ServerError {
                code,
                message: err.msg.clone(),
            },
        }
    }
}

// =============================================================================
// Authentication State
// =============================================================================

/// Current state of authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Not yet connected or authentication not started.
    #[default]
    Disconnected,

    /// Connected but not authenticated.
    Connected,

    /// Authentication request sent, awaiting response.
    Authenticating,

    /// Successfully authenticated.
    Authenticated,

    /// Authentication failed.
    Failed,
}

impl AuthState {
    /// Check if currently authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Check if authentication is in progress.
    #[must_use]
    pub const fn is_authenticating(&self) -> bool {
        matches!(self, Self::Authenticating)
    }

    /// Check if ready to authenticate (connected but not yet authenticated).
    #[must_use]
    pub const fn can_authenticate(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Provider API credentials.
///
/// Stores the API key and secret needed for authentication.
/// The `Display` implementation redacts the secret for safe logging.
#[derive(Clone)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    /// Create new credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if either key or secret is empty.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self, AuthError> {
        let key = key.into();
        let secret = secret.into();

        if key.is_empty() {
            return Err(AuthError::InvalidMessage(
                "API key cannot be empty".to_string(),
            ));
        }
        if secret.is_empty() {
            return Err(AuthError::InvalidMessage(
                "API secret cannot be empty".to_string(),
            ));
        }

        Ok(Self { key, secret })
    }

    /// Create credentials from environment variables.
    ///
    /// Reads `PROVIDER_KEY` and `PROVIDER_SECRET` from environment.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are not set or empty.
    pub fn from_env() -> Result<Self, AuthError> {
        let key = std::env::var("PROVIDER_KEY").map_err(|_| {
            AuthError::InvalidMessage("PROVIDER_KEY environment variable not set".to_string())
        })?;
        let secret = std::env::var("PROVIDER_SECRET").map_err(|_| {
            AuthError::InvalidMessage("PROVIDER_SECRET environment variable not set".to_string())
        })?;

        Self::new(key, secret)
    }

    /// Get the API key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the API secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Create an authentication request.
    #[must_use]
    pub fn to_auth_request(&self) -> AuthRequest {
        AuthRequest::new(&self.key, &self.secret)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Display for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credentials(key={})", self.key)
    }
}

// =============================================================================
// Authentication Handler
// =============================================================================

/// Handles the authentication state machine for a provider WebSocket
/// connection. One flow serves all three feed kinds.
///
/// # Example
///
/// ```ignore
/// use provider_proxy::infrastructure::provider::auth::{AuthHandler, Credentials};
///
/// let creds = Credentials::new("api_key", "api_secret")?;
/// let mut handler = AuthHandler::new(creds);
///
/// handler.on_connected();
/// let auth_msg = handler.create_auth_request();
/// // Send auth_msg over WebSocket...
///
/// handler.on_success(&success_msg)?;
/// assert!(handler.is_authenticated());
/// ```
#[derive(Debug)]
pub struct AuthHandler {
    credentials: Credentials,
    state: AuthState,
}

impl AuthHandler {
    /// Create a new authentication handler.
    #[must_use]
    pub const fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: AuthState::Disconnected,
        }
    }

    /// Get the current authentication state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// Check if currently authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Called when the WebSocket connection is established.
    pub const fn on_connected(&mut self) {
        self.state = AuthState::Connected;
    }

    /// Create the authentication request message.
    ///
    /// Call this after `on_connected()` and send the result.
    #[must_use]
    pub fn create_auth_request(&mut self) -> AuthRequest {
        self.state = AuthState::Authenticating;
        self.credentials.to_auth_request()
    }

    /// Process a success message from the server.
    ///
    /// # Errors
    ///
    /// Never actually errors today (reserved for future success kinds that
    /// require specific prior state); returns `Result` for forward
    /// compatibility with the other `on_*` handlers.
    pub fn on_success(&mut self, msg: &SuccessMessage) -> Result<bool, AuthError> {
        match msg.msg {
            SuccessKind::Authenticated => {
                self.state = AuthState::Authenticated;
                Ok(true)
            }
            SuccessKind::Unsubscribed => Ok(false),
        }
    }

    /// Process an error message from the server.
    ///
    /// # Errors
    ///
    /// Always returns an `AuthError` corresponding to the error code.
    pub fn on_error(&mut self, msg: &ErrorMessage) -> AuthError {
        self.state = AuthState::Failed;
        AuthError::from(msg)
    }

    /// Reset to disconnected state (e.g., after connection close).
    pub const fn reset(&mut self) {
        self.state = AuthState::Disconnected;
    }
}
