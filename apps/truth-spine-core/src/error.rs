//! Rich error handling for the nightly analytics platform.
//!
//! Structured error types compatible with gRPC rich errors via `tonic-types`,
//! even though the gRPC surface itself is out of scope — callers that do
//! expose one reuse this mapping.
//!
//! # gRPC status codes
//!
//! | Code | Name | Usage |
//! |------|------|-------|
//! | `INVALID_ARGUMENT` (3) | Invalid Argument | Malformed alert condition, bad request |
//! | `NOT_FOUND` (5) | Not Found | Unknown portfolio, pack, or alert |
//! | `FAILED_PRECONDITION` (9) | Failed Precondition | Reconciliation breach, attribution identity violation |
//! | `UNAVAILABLE` (14) | Unavailable | No fresh pack yet (freshness gate) |
//! | `INTERNAL` (13) | Internal Error | Unexpected failure |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tonic::Code;
use tonic_types::{ErrorDetails, StatusExt};

/// Domain for Truth Spine errors (gRPC `ErrorInfo.domain`).
pub const ERROR_DOMAIN: &str = "truthspine.core";

/// Error codes for the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request or alert condition.
    InvalidRequest,
    /// Unknown portfolio, security, or macro series name.
    UnknownEntity,
    /// No fresh pricing pack is available yet for the requested date.
    PackNotReady,
    /// Pricing pack build failed (provider exhaustion, hash mismatch).
    PackBuildFailed,
    /// Ledger-vs-pack reconciliation found a discrepancy beyond tolerance.
    ReconciliationBreach,
    /// Currency attribution identity check failed.
    AttributionIdentityViolation,
    /// Requested portfolio, pack, or alert does not exist.
    NotFound,
    /// Upstream provider call failed after exhausting retries.
    ProviderError,
    /// Unexpected internal failure.
    InternalError,
}

impl ErrorCode {
    /// The gRPC status code for this error.
    #[must_use]
    pub const fn grpc_code(&self) -> Code {
        match self {
            Self::InvalidRequest => Code::InvalidArgument,
            Self::UnknownEntity | Self::NotFound => Code::NotFound,
            Self::PackNotReady => Code::Unavailable,
            Self::PackBuildFailed | Self::ReconciliationBreach | Self::AttributionIdentityViolation => {
                Code::FailedPrecondition
            }
            Self::ProviderError | Self::InternalError => Code::Internal,
        }
    }

    /// Machine-readable reason string (for gRPC `ErrorInfo.reason`).
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::UnknownEntity => "UNKNOWN_ENTITY",
            Self::PackNotReady => "PACK_NOT_READY",
            Self::PackBuildFailed => "PACK_BUILD_FAILED",
            Self::ReconciliationBreach => "RECONCILIATION_BREACH",
            Self::AttributionIdentityViolation => "ATTRIBUTION_IDENTITY_VIOLATION",
            Self::NotFound => "NOT_FOUND",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A rich error with context, the boundary type every layer converges on.
#[derive(Debug, Error)]
pub struct TruthSpineError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl TruthSpineError {
    /// Create a new error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Attach a key/value pair of diagnostic context.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// The error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attached context pairs.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Convert to a `tonic::Status` with rich error details.
    #[must_use]
    pub fn to_status(&self) -> tonic::Status {
        let mut details = ErrorDetails::new();
        let metadata: HashMap<String, String> = self.context.iter().cloned().collect();
        details.set_error_info(self.code.reason(), ERROR_DOMAIN, metadata);

        if self.code == ErrorCode::InvalidRequest {
            details.add_bad_request_violation("request", &self.message);
        }
        if matches!(
            self.code,
            ErrorCode::ReconciliationBreach | ErrorCode::AttributionIdentityViolation
        ) {
            details.add_precondition_failure_violation("tolerance", self.code.reason(), &self.message);
        }

        tonic::Status::with_error_details(self.code.grpc_code(), &self.message, details)
    }
}

impl std::fmt::Display for TruthSpineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

impl TruthSpineError {
    /// A malformed request or alert condition.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// No fresh pack is available for the requested `(asof_date, policy)`.
    #[must_use]
    pub fn pack_not_ready(asof_date: &str, policy: &str) -> Self {
        Self::new(ErrorCode::PackNotReady, format!("no fresh pack for {asof_date} ({policy})"))
            .with_context("asof_date", asof_date)
            .with_context("policy", policy)
    }

    /// An entity does not exist.
    #[must_use]
    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{kind} {id} not found")).with_context(kind, id)
    }

    /// An internal, unexpected failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Classifies an error for retry purposes: exactly one of three
/// dispositions, never inferred from error type at the call site.
///
/// Used by the capability runtime (§4.5): `Transient` errors are retried up
/// to three times with backoff, `Validation` and `Fatal` errors are
/// re-raised on the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition<E> {
    /// A transient upstream failure; safe to retry.
    Transient(E),
    /// A request validation failure; retrying would not help.
    Validation(E),
    /// A programming or invariant error; retrying would not help.
    Fatal(E),
}

impl<E> Disposition<E> {
    /// Whether this disposition should be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// The wrapped error, regardless of disposition.
    pub fn into_inner(self) -> E {
        match self {
            Self::Transient(e) | Self::Validation(e) | Self::Fatal(e) => e,
        }
    }
}
