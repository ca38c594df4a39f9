// ABOUTME: OAuth module organizing the broker, handler registry, and redirect utilities
// ABOUTME: Defines the handler and credential-store capability traits all providers implement
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # OAuth Orchestration
//!
//! Uniform handling of the authorization-code flow across all providers.
//! The [`OAuthBroker`] drives the workflow, the [`HandlerRegistry`] owns the
//! lazily built per-provider [`OAuth2Handler`] singletons, and [`relay`]
//! validates redirect targets.

/// Request-level orchestration of the authorize/authenticate/refresh flows
pub mod broker;

/// Lazy, cached resolution of per-provider handlers
pub mod registry;

/// Relay validation and redirect query building
pub mod relay;

pub use broker::OAuthBroker;
pub use registry::{HandlerFactory, HandlerRegistry};

use std::collections::HashMap;

use crate::errors::HandlerError;
use crate::models::{OAuthInfo, TokenData};

/// Per-provider implementation of the authorize/authenticate/refresh
/// capability set.
///
/// One instance exists per configured client, constructed lazily by the
/// [`HandlerRegistry`] and shared read-only across all concurrent requests
/// for that client.
#[async_trait::async_trait]
pub trait OAuth2Handler: Send + Sync + std::fmt::Debug {
    /// Build the provider's authorization-endpoint redirect URL, carrying
    /// `relay` through the flow as OAuth state.
    async fn authorize(&self, relay: &str) -> Result<String, HandlerError>;

    /// Parameter names this provider sends back on its redirect callback.
    fn authenticate_param_keys(&self) -> &'static [&'static str];

    /// Check the extracted callback parameters before any token exchange.
    fn verify_authenticate_params(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<(), HandlerError>;

    /// Exchange the authorization code and persist the resulting credential
    /// for the host account identified by the session token.
    async fn authenticate(&self, info: &OAuthInfo) -> Result<(), HandlerError>;

    /// Re-exchange the stored refresh token for `info.username`.
    async fn refresh(&self, info: &OAuthInfo) -> Result<bool, HandlerError>;

    /// The caller's requested post-flow redirect target, recovered from the
    /// callback parameters.
    fn relay(&self, params: &HashMap<String, String>) -> String;
}

/// Persistence boundary for exchanged credentials.
///
/// Implemented by the host application (e.g. against its mailbox/datasource
/// store); the broker never inspects what happens behind it.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a credential for the account identified by the host session.
    async fn save(
        &self,
        session_token: &str,
        username: &str,
        token: &TokenData,
    ) -> Result<(), HandlerError>;

    /// Look up the stored refresh token for a provider account, if any.
    async fn stored_refresh_token(
        &self,
        provider: &str,
        username: &str,
    ) -> Result<Option<String>, HandlerError>;
}
