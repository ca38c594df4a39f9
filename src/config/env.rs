// ABOUTME: Environment-backed configuration resolver for the known clients
// ABOUTME: Maps BROKER_<CLIENT>_* variables onto the dotted-key contract, with legacy fallbacks
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::collections::HashMap;
use std::env;

use super::{ConfigResolver, Configuration};
use crate::constants::{clients, HANDLER_IMPL_PREFIX};
use crate::errors::BrokerError;

/// Builds per-client configuration from environment variables.
///
/// For each known client (see [`clients::ALL`]):
/// - `BROKER_<CLIENT>_CLIENT_ID` (falls back to `<CLIENT>_CLIENT_ID`)
/// - `BROKER_<CLIENT>_CLIENT_SECRET` (falls back to `<CLIENT>_CLIENT_SECRET`)
/// - `BROKER_<CLIENT>_REDIRECT_URI` (defaults to
///   `<base-url>/oauth2/authenticate/<client>`)
/// - `BROKER_<CLIENT>_SCOPES`, `BROKER_<CLIENT>_AUTH_URL`,
///   `BROKER_<CLIENT>_TOKEN_URL`: optional overrides; handlers fall back to
///   their built-in defaults when the keys are absent
/// - `BROKER_<CLIENT>_HANDLER`: handler implementation identifier, defaults
///   to the client identifier itself
///
/// The base URL comes from `BROKER_BASE_URL` (default `http://localhost:8080`).
pub struct EnvConfigResolver {
    base_url: String,
}

impl EnvConfigResolver {
    /// Resolver reading the base URL from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("BROKER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_owned()),
        }
    }

    /// Resolver with an explicit base URL for redirect-URI defaults.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for EnvConfigResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ConfigResolver for EnvConfigResolver {
    fn resolve(&self, client: &str) -> Result<Configuration, BrokerError> {
        if !clients::ALL.contains(&client) {
            return Err(BrokerError::invalid_client(client));
        }

        let upper = client.to_uppercase();
        let mut values = HashMap::new();

        values.insert(
            format!("{HANDLER_IMPL_PREFIX}{client}"),
            env::var(format!("BROKER_{upper}_HANDLER")).unwrap_or_else(|_| client.to_owned()),
        );

        if let Some(id) = env_with_fallback(&format!("BROKER_{upper}_CLIENT_ID"), &upper, "CLIENT_ID")
        {
            values.insert(format!("oauth.{client}.client_id"), id);
        }
        if let Some(secret) =
            env_with_fallback(&format!("BROKER_{upper}_CLIENT_SECRET"), &upper, "CLIENT_SECRET")
        {
            values.insert(format!("oauth.{client}.client_secret"), secret);
        }

        values.insert(
            format!("oauth.{client}.redirect_uri"),
            env::var(format!("BROKER_{upper}_REDIRECT_URI")).unwrap_or_else(|_| {
                format!("{}/oauth2/authenticate/{client}", self.base_url)
            }),
        );

        if let Ok(scope) = env::var(format!("BROKER_{upper}_SCOPES")) {
            values.insert(format!("oauth.{client}.scope"), scope);
        }
        if let Ok(auth_url) = env::var(format!("BROKER_{upper}_AUTH_URL")) {
            values.insert(format!("oauth.{client}.authorize_endpoint"), auth_url);
        }
        if let Ok(token_url) = env::var(format!("BROKER_{upper}_TOKEN_URL")) {
            values.insert(format!("oauth.{client}.token_endpoint"), token_url);
        }

        Ok(Configuration::new(client, values))
    }
}

/// Read a `BROKER_`-prefixed variable, falling back to the legacy unprefixed name.
fn env_with_fallback(primary: &str, upper_client: &str, suffix: &str) -> Option<String> {
    env::var(primary)
        .or_else(|_| env::var(format!("{upper_client}_{suffix}")))
        .ok()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn unknown_client_is_rejected_without_touching_env() {
        let resolver = EnvConfigResolver::with_base_url("http://mail.test");
        let err = resolver.resolve("myspace").unwrap_err();
        assert!(matches!(err, BrokerError::InvalidClient(_)));
    }

    #[test]
    fn known_client_resolves_with_defaults() {
        env::set_var("BROKER_YAHOO_CLIENT_ID", "id-123");
        env::set_var("BROKER_YAHOO_CLIENT_SECRET", "secret-456");

        let resolver = EnvConfigResolver::with_base_url("http://mail.test");
        let config = resolver.resolve("yahoo").unwrap();

        assert_eq!(config.get("classes.handlers.yahoo"), Some("yahoo"));
        assert_eq!(config.get("oauth.yahoo.client_id"), Some("id-123"));
        assert_eq!(
            config.get("oauth.yahoo.redirect_uri"),
            Some("http://mail.test/oauth2/authenticate/yahoo")
        );
        assert_eq!(config.get("oauth.yahoo.scope"), None);
    }
}
