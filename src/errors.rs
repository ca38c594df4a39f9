// ABOUTME: Error types for handler resolution and the authentication workflow
// ABOUTME: Separates caller-facing broker errors from classified provider failures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use thiserror::Error;

/// Result alias for broker-level operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Failures surfaced to the caller of the broker.
///
/// Once a handler has been resolved, `authenticate` converts every
/// downstream failure into redirect query parameters instead; these
/// variants only escape from handler resolution and from the non-redirect
/// operations (`authorize`, `refresh`).
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Configuration could not be resolved or the handler implementation
    /// could not be constructed. The underlying cause is logged, not carried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The client identifier is unknown or unconfigured.
    #[error("unknown client: {0}")]
    InvalidClient(String),

    /// A handler failure propagated unchanged (authorize and refresh paths).
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl BrokerError {
    /// Configuration failure with a descriptive message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Unknown-client failure for the given identifier.
    pub fn invalid_client(client: impl Into<String>) -> Self {
        Self::InvalidClient(client.into())
    }
}

/// Classified failure raised by a provider handler.
///
/// The classification is data, not an error-code string comparison: the
/// broker maps `PermissionDenied` to `access_denied` and everything else to
/// either the failure's own wire code (parameter validation) or
/// `authentication_error` (token exchange), per the redirect contract.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// The user or the provider denied the authorization request.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Any other failure, carrying its wire error code and detail.
    #[error("{code}: {message}")]
    Failed {
        /// Machine-readable error code.
        code: String,
        /// Human-readable detail.
        message: String,
    },
}

impl HandlerError {
    /// Non-permission failure with the given wire code and detail.
    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Failure for a malformed or incomplete request.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::failed(crate::constants::error_codes::INVALID_REQUEST, message)
    }
}
