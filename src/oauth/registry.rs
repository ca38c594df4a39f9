// ABOUTME: Handler registry mapping client identifiers to singleton handler instances
// ABOUTME: Double-checked lazy construction with lock-free reads of cached entries
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{CredentialStore, OAuth2Handler};
use crate::config::{ConfigResolver, Configuration};
use crate::constants::HANDLER_IMPL_PREFIX;
use crate::errors::BrokerError;
use crate::handlers::{google, outlook, yahoo};

/// Constructs a handler from a client's resolved configuration.
///
/// Factories are selected at registry construction time by implementation
/// identifier (the `classes.handlers.<client>` configuration value), so the
/// "which concrete handler" indirection stays configurable without any
/// runtime reflection.
pub trait HandlerFactory: Send + Sync {
    /// Build a handler instance for the configured client.
    fn create(
        &self,
        config: &Configuration,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Arc<dyn OAuth2Handler>, BrokerError>;
}

/// Maps a client identifier to its singleton [`OAuth2Handler`].
///
/// Handlers are built on first use and cached for the process lifetime.
/// The cache read path is lock-free; a single build mutex serializes the
/// check-then-construct-then-insert sequence so at most one handler is ever
/// constructed per client, even under concurrent first access.
pub struct HandlerRegistry {
    cache: DashMap<String, Arc<dyn OAuth2Handler>>,
    build_lock: Mutex<()>,
    factories: HashMap<&'static str, Box<dyn HandlerFactory>>,
    resolver: Arc<dyn ConfigResolver>,
    store: Arc<dyn CredentialStore>,
}

impl HandlerRegistry {
    /// Registry with the built-in provider factories.
    #[must_use]
    pub fn new(resolver: Arc<dyn ConfigResolver>, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_factories(resolver, store, builtin_factories())
    }

    /// Registry with a custom factory table.
    ///
    /// Lets hosts and tests register additional or replacement handler
    /// implementations, keyed by implementation identifier.
    #[must_use]
    pub fn with_factories(
        resolver: Arc<dyn ConfigResolver>,
        store: Arc<dyn CredentialStore>,
        factories: HashMap<&'static str, Box<dyn HandlerFactory>>,
    ) -> Self {
        let implementations = factories.keys().copied().collect::<Vec<_>>().join(", ");
        info!(
            "handler registry initialized with {} implementation(s): [{}]",
            factories.len(),
            implementations
        );
        Self {
            cache: DashMap::new(),
            build_lock: Mutex::new(()),
            factories,
            resolver,
            store,
        }
    }

    /// Resolve the handler for `client`, building and caching it on first use.
    ///
    /// Fails with [`BrokerError::InvalidClient`] for unknown identifiers and
    /// [`BrokerError::Configuration`] when configuration cannot be resolved
    /// or the implementation cannot be constructed. Underlying causes are
    /// logged, never returned verbatim.
    pub async fn handler(&self, client: &str) -> Result<Arc<dyn OAuth2Handler>, BrokerError> {
        // common path: already cached, no locking beyond the shard read
        if let Some(handler) = self.cache.get(client) {
            return Ok(Arc::clone(handler.value()));
        }

        let _build = self.build_lock.lock().await;

        // re-check: a concurrent caller may have just finished building it
        if let Some(handler) = self.cache.get(client) {
            return Ok(Arc::clone(handler.value()));
        }

        let config = self.resolver.resolve(client).map_err(|e| match e {
            BrokerError::InvalidClient(_) => e,
            other => {
                error!(error = %other, "there was an issue loading the configuration for client: {client}");
                BrokerError::configuration(format!(
                    "there was an issue loading the configuration for client: {client}"
                ))
            }
        })?;

        let impl_key = format!("{HANDLER_IMPL_PREFIX}{client}");
        let impl_id = config.get(&impl_key).ok_or_else(|| {
            error!("no handler implementation configured under {impl_key}");
            BrokerError::configuration(format!(
                "no handler implementation configured for client: {client}"
            ))
        })?;

        let factory = self.factories.get(impl_id).ok_or_else(|| {
            error!("unknown handler implementation `{impl_id}` for client: {client}");
            BrokerError::configuration(format!(
                "there was an issue loading the handler for client: {client}"
            ))
        })?;

        let handler = factory
            .create(&config, Arc::clone(&self.store))
            .map_err(|e| {
                error!(error = %e, "there was an issue instantiating the handler for client: {client}");
                BrokerError::configuration(format!(
                    "there was an issue instantiating the handler for client: {client}"
                ))
            })?;

        self.cache.insert(client.to_owned(), Arc::clone(&handler));
        info!("cached handler for client: {client}");
        Ok(handler)
    }
}

/// Factory table for the built-in providers.
fn builtin_factories() -> HashMap<&'static str, Box<dyn HandlerFactory>> {
    let mut factories: HashMap<&'static str, Box<dyn HandlerFactory>> = HashMap::new();
    factories.insert(yahoo::HANDLER_ID, Box::new(yahoo::YahooHandlerFactory));
    factories.insert(google::HANDLER_ID, Box::new(google::GoogleHandlerFactory));
    factories.insert(outlook::HANDLER_ID, Box::new(outlook::OutlookHandlerFactory));
    factories
}
