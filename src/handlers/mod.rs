// ABOUTME: Concrete per-provider OAuth2 handlers and their shared plumbing
// ABOUTME: Each provider gets its own module, factory, and token-response shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Provider handlers.
//!
//! Each module implements [`crate::oauth::OAuth2Handler`] for one identity
//! provider, built from the client's [`crate::config::Configuration`] and
//! the host's [`crate::oauth::CredentialStore`]. Handlers differ only in
//! endpoints, credential presentation (Basic auth vs. form fields), and how
//! the account identity is recovered from the token response.

/// Google / Gmail handler
pub mod google;

/// Microsoft Outlook handler
pub mod outlook;

/// Yahoo mail handler
pub mod yahoo;

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

use crate::errors::HandlerError;

/// Dotted configuration key for a client's OAuth settings.
pub(crate) fn config_key(client: &str, suffix: &str) -> String {
    format!("oauth.{client}.{suffix}")
}

/// Claims of interest in a provider `id_token`.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
}

/// Recover the account identity from an `id_token` JWT payload.
///
/// The signature is not checked: the token arrived over TLS directly from
/// the provider's token endpoint in exchange for a code we sent.
pub(crate) fn id_token_account(id_token: &str) -> Result<String, HandlerError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| HandlerError::invalid_request("malformed id_token"))?;

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| HandlerError::invalid_request(format!("undecodable id_token payload: {e}")))?;

    let claims: IdTokenClaims = serde_json::from_slice(&bytes)
        .map_err(|e| HandlerError::invalid_request(format!("unreadable id_token claims: {e}")))?;

    claims
        .email
        .or(claims.preferred_username)
        .ok_or_else(|| HandlerError::invalid_request("id_token carries no account claims"))
}
