// ABOUTME: Shared test doubles for broker and registry integration tests
// ABOUTME: Scripted handlers, counting factories, and an in-memory credential store
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use oauth_broker::config::StaticConfigResolver;
use oauth_broker::models::{OAuthInfo, TokenData};
use oauth_broker::oauth::HandlerFactory;
use oauth_broker::{BrokerError, CredentialStore, HandlerError, HandlerRegistry, OAuth2Handler};

/// In-memory credential store recording every save.
#[derive(Default)]
pub struct MemoryStore {
    pub saved: Mutex<Vec<(String, String, TokenData)>>,
    pub refresh_tokens: Mutex<HashMap<(String, String), String>>,
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn save(
        &self,
        session_token: &str,
        username: &str,
        token: &TokenData,
    ) -> Result<(), HandlerError> {
        self.saved.lock().unwrap().push((
            session_token.to_owned(),
            username.to_owned(),
            token.clone(),
        ));
        Ok(())
    }

    async fn stored_refresh_token(
        &self,
        provider: &str,
        username: &str,
    ) -> Result<Option<String>, HandlerError> {
        Ok(self
            .refresh_tokens
            .lock()
            .unwrap()
            .get(&(provider.to_owned(), username.to_owned()))
            .cloned())
    }
}

/// Handler whose behavior is scripted per test, recording which operations ran.
#[derive(Debug)]
pub struct ScriptedHandler {
    pub verify_failure: Option<HandlerError>,
    pub authenticate_failure: Option<HandlerError>,
    pub authorize_failure: Option<HandlerError>,
    pub refresh_result: Result<bool, HandlerError>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl ScriptedHandler {
    pub fn ok() -> Self {
        Self {
            verify_failure: None,
            authenticate_failure: None,
            authorize_failure: None,
            refresh_result: Ok(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn called(&self, operation: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|op| *op == operation)
    }
}

#[async_trait]
impl OAuth2Handler for ScriptedHandler {
    async fn authorize(&self, relay: &str) -> Result<String, HandlerError> {
        self.calls.lock().unwrap().push("authorize");
        match &self.authorize_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(format!(
                "https://provider.test/authorize?response_type=code&state={}",
                urlencoding::encode(relay)
            )),
        }
    }

    fn authenticate_param_keys(&self) -> &'static [&'static str] {
        &["code", "error", "state"]
    }

    fn verify_authenticate_params(
        &self,
        _params: &HashMap<String, String>,
    ) -> Result<(), HandlerError> {
        self.calls.lock().unwrap().push("verify");
        match &self.verify_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn authenticate(&self, _info: &OAuthInfo) -> Result<(), HandlerError> {
        self.calls.lock().unwrap().push("authenticate");
        match &self.authenticate_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn refresh(&self, _info: &OAuthInfo) -> Result<bool, HandlerError> {
        self.calls.lock().unwrap().push("refresh");
        self.refresh_result.clone()
    }

    fn relay(&self, params: &HashMap<String, String>) -> String {
        params.get("state").cloned().unwrap_or_default()
    }
}

/// Factory handing out a fixed handler instance, counting constructions.
pub struct ScriptedFactory {
    handler: Arc<ScriptedHandler>,
    builds: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new(handler: ScriptedHandler) -> (Self, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        (
            Self {
                handler: Arc::new(handler),
                builds: Arc::clone(&builds),
            },
            builds,
        )
    }

    pub fn handler(&self) -> Arc<ScriptedHandler> {
        Arc::clone(&self.handler)
    }
}

impl HandlerFactory for ScriptedFactory {
    fn create(
        &self,
        _config: &oauth_broker::config::Configuration,
        _store: Arc<dyn CredentialStore>,
    ) -> Result<Arc<dyn OAuth2Handler>, BrokerError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(self.handler.clone())
    }
}

/// Factory that always fails to construct.
pub struct FailingFactory;

impl HandlerFactory for FailingFactory {
    fn create(
        &self,
        _config: &oauth_broker::config::Configuration,
        _store: Arc<dyn CredentialStore>,
    ) -> Result<Arc<dyn OAuth2Handler>, BrokerError> {
        Err(BrokerError::configuration("constructor blew up"))
    }
}

/// Registry over one scripted client backed by the given factory.
pub fn registry_with(
    client: &str,
    impl_id: &'static str,
    factory: Box<dyn HandlerFactory>,
) -> HandlerRegistry {
    let resolver = StaticConfigResolver::new().with_client(
        client,
        HashMap::from([(format!("classes.handlers.{client}"), impl_id.to_owned())]),
    );
    let mut factories: HashMap<&'static str, Box<dyn HandlerFactory>> = HashMap::new();
    factories.insert(impl_id, factory);
    HandlerRegistry::with_factories(
        Arc::new(resolver),
        Arc::new(MemoryStore::default()),
        factories,
    )
}
