// ABOUTME: Application constants for query parameters, error codes, and client identifiers
// ABOUTME: Centralizes the redirect wire contract so no handler hardcodes strings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

/// Query-parameter names used on provider callbacks and outbound redirects.
pub mod query {
    /// Machine-readable error code appended to redirects; also the error
    /// parameter providers send back on a denied authorization.
    pub const ERROR: &str = "error";

    /// Human-readable error detail appended to redirects.
    pub const ERROR_MSG: &str = "error_msg";

    /// Authorization code returned by the provider callback.
    pub const CODE: &str = "code";

    /// Opaque state round-tripped through the provider, carrying the relay.
    pub const STATE: &str = "state";
}

/// Machine-readable error codes appended to redirect URLs.
pub mod error_codes {
    /// The user or provider denied the authorization request.
    pub const ACCESS_DENIED: &str = "access_denied";

    /// No authenticated host session accompanied the callback, so there is
    /// no account to attach the new credential to. The legacy code value is
    /// kept for webmail client compatibility.
    pub const INVALID_SESSION: &str = "invalid_zm_auth_code";

    /// Token exchange or credential persistence failed.
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";

    /// The provider callback was missing required parameters.
    pub const INVALID_REQUEST: &str = "invalid_request";
}

/// Detail message attached to [`error_codes::INVALID_SESSION`] redirects.
pub const INVALID_SESSION_MSG: &str =
    "no authenticated session was found to attach the new credential to";

/// Fallback redirect target when no valid relay was supplied.
pub const DEFAULT_SUCCESS_REDIRECT: &str = "/";

/// Configuration key prefix mapping a client to its handler implementation
/// identifier, e.g. `classes.handlers.yahoo`.
pub const HANDLER_IMPL_PREFIX: &str = "classes.handlers.";

/// Known provider client identifiers.
pub mod clients {
    /// Yahoo mail provider identifier
    pub const YAHOO: &str = "yahoo";

    /// Google / Gmail provider identifier
    pub const GOOGLE: &str = "google";

    /// Microsoft Outlook provider identifier
    pub const OUTLOOK: &str = "outlook";

    /// All clients the environment resolver will accept.
    pub const ALL: &[&str] = &[YAHOO, GOOGLE, OUTLOOK];
}
