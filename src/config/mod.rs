// ABOUTME: Configuration contract consumed by the handler registry and handlers
// ABOUTME: Immutable per-client key/value views plus pluggable resolvers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Per-client configuration.
//!
//! A [`Configuration`] is an immutable view of dotted string keys scoped to
//! one provider client; it is built once, on first handler construction, and
//! cached alongside the handler for the process lifetime. How the values are
//! loaded is a [`ConfigResolver`] concern: the broker ships an
//! environment-backed resolver and an in-memory one, and hosts may supply
//! their own.

mod env;

pub use env::EnvConfigResolver;

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::BrokerError;

/// Immutable string-keyed configuration for a single client.
#[derive(Debug, Clone)]
pub struct Configuration {
    client: String,
    values: Arc<HashMap<String, String>>,
}

impl Configuration {
    /// Wrap a resolved key/value map for a client.
    #[must_use]
    pub fn new(client: impl Into<String>, values: HashMap<String, String>) -> Self {
        Self {
            client: client.into(),
            values: Arc::new(values),
        }
    }

    /// The client this configuration is scoped to.
    #[must_use]
    pub fn client(&self) -> &str {
        &self.client
    }

    /// Look up a value by dotted key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a value, falling back to a default.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up a value that must be present.
    pub fn require(&self, key: &str) -> Result<&str, BrokerError> {
        self.get(key).ok_or_else(|| {
            BrokerError::configuration(format!(
                "missing configuration key `{key}` for client: {}",
                self.client
            ))
        })
    }
}

/// Produces the [`Configuration`] for a client identifier.
pub trait ConfigResolver: Send + Sync {
    /// Resolve configuration for `client`.
    ///
    /// Fails with [`BrokerError::InvalidClient`] for unknown identifiers and
    /// [`BrokerError::Configuration`] when resolution itself fails.
    fn resolve(&self, client: &str) -> Result<Configuration, BrokerError>;
}

/// In-memory resolver over a fixed set of clients.
///
/// Useful for tests and for hosts that load configuration themselves.
#[derive(Debug, Default)]
pub struct StaticConfigResolver {
    clients: HashMap<String, HashMap<String, String>>,
}

impl StaticConfigResolver {
    /// Empty resolver; add clients with [`Self::with_client`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and its configuration values.
    #[must_use]
    pub fn with_client(
        mut self,
        client: impl Into<String>,
        values: HashMap<String, String>,
    ) -> Self {
        self.clients.insert(client.into(), values);
        self
    }
}

impl ConfigResolver for StaticConfigResolver {
    fn resolve(&self, client: &str) -> Result<Configuration, BrokerError> {
        self.clients
            .get(client)
            .map(|values| Configuration::new(client, values.clone()))
            .ok_or_else(|| BrokerError::invalid_client(client))
    }
}
