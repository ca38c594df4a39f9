// ABOUTME: Shared data model for the credential broker
// ABOUTME: Per-request auth info, exchanged token data, error params, and response envelopes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::query;

/// An exchanged OAuth credential as persisted for a provider account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    /// Bearer access token
    pub access_token: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
    /// Granted scopes
    pub scopes: String,
    /// Owning provider identifier
    pub provider: String,
}

/// Transient per-request bundle handed to a handler.
///
/// `authenticate` fills `params` from the callback query string and attaches
/// the host session token; `refresh` sets the client/username fields directly
/// since no browser round-trip is involved. Discarded after the call.
#[derive(Debug, Clone, Default)]
pub struct OAuthInfo {
    /// Extracted request parameters, one value per expected key.
    pub params: HashMap<String, String>,
    /// The host application's own session token, identifying the account the
    /// new credential attaches to.
    pub session_token: Option<String>,
    /// Provider client identifier (refresh only).
    pub client_id: Option<String>,
    /// Provider account username (refresh only).
    pub username: Option<String>,
}

impl OAuthInfo {
    /// Bundle the extracted callback parameters.
    #[must_use]
    pub fn new(params: HashMap<String, String>) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Look up a single extracted parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Uniform envelope for structured (non-redirect) responses.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseObject<T> {
    /// The wrapped payload.
    pub data: T,
}

impl<T> ResponseObject<T> {
    /// Wrap a payload.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Error code and optional detail accumulated during the authenticate flow.
///
/// Empty means success. At most one code is ever recorded per request:
/// the broker only writes into an empty instance, so the first failure wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorParams {
    code: Option<String>,
    message: Option<String>,
}

impl ErrorParams {
    /// True when no failure has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
    }

    /// Record an error code with optional human-readable detail.
    pub fn set(&mut self, code: impl Into<String>, message: Option<String>) {
        self.code = Some(code.into());
        self.message = message;
    }

    /// The recorded code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Render as `error`/`error_msg` query pairs for the redirect.
    #[must_use]
    pub fn as_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(code) = &self.code {
            pairs.push((query::ERROR, code.as_str()));
        }
        if let Some(message) = &self.message {
            pairs.push((query::ERROR_MSG, message.as_str()));
        }
        pairs
    }
}
