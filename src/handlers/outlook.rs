// ABOUTME: Outlook OAuth2 handler against the Microsoft identity platform v2 endpoints
// ABOUTME: offline_access scope for refresh tokens; account identity from the id_token
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{config_key, id_token_account};
use crate::config::Configuration;
use crate::constants::query;
use crate::errors::{BrokerError, HandlerError};
use crate::models::{OAuthInfo, TokenData};
use crate::oauth::{CredentialStore, HandlerFactory, OAuth2Handler};

/// Implementation identifier selected by `classes.handlers.<client>`.
pub const HANDLER_ID: &str = "outlook";

const AUTHORIZE_ENDPOINT: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";
const TOKEN_ENDPOINT: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
const DEFAULT_SCOPE: &str = "openid email offline_access https://outlook.office.com/Mail.Read";

const AUTHENTICATE_PARAM_KEYS: &[&str] = &[query::CODE, query::ERROR, query::STATE];

/// Microsoft identity platform token response.
#[derive(Debug, Deserialize)]
struct OutlookTokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    id_token: Option<String>,
}

/// Factory registered under [`HANDLER_ID`].
pub struct OutlookHandlerFactory;

impl HandlerFactory for OutlookHandlerFactory {
    fn create(
        &self,
        config: &Configuration,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Arc<dyn OAuth2Handler>, BrokerError> {
        Ok(Arc::new(OutlookHandler::from_config(config, store)?))
    }
}

/// OAuth2 handler for Outlook / Microsoft accounts.
pub struct OutlookHandler {
    client: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
    authorize_endpoint: String,
    token_endpoint: String,
    http: reqwest::Client,
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for OutlookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlookHandler")
            .field("client", &self.client)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("authorize_endpoint", &self.authorize_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .finish_non_exhaustive()
    }
}

impl OutlookHandler {
    /// Build a handler from the client's resolved configuration.
    pub fn from_config(
        config: &Configuration,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, BrokerError> {
        let client = config.client().to_owned();
        Ok(Self {
            client_id: config.require(&config_key(&client, "client_id"))?.to_owned(),
            client_secret: config
                .require(&config_key(&client, "client_secret"))?
                .to_owned(),
            redirect_uri: config
                .require(&config_key(&client, "redirect_uri"))?
                .to_owned(),
            scope: config
                .get_or(&config_key(&client, "scope"), DEFAULT_SCOPE)
                .to_owned(),
            authorize_endpoint: config
                .get_or(&config_key(&client, "authorize_endpoint"), AUTHORIZE_ENDPOINT)
                .to_owned(),
            token_endpoint: config
                .get_or(&config_key(&client, "token_endpoint"), TOKEN_ENDPOINT)
                .to_owned(),
            http: reqwest::Client::new(),
            store,
            client,
        })
    }

    async fn exchange(&self, form: &[(&str, &str)]) -> Result<OutlookTokenResponse, HandlerError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| HandlerError::failed("token_exchange_failed", e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| HandlerError::failed("token_exchange_failed", e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| HandlerError::failed("token_exchange_failed", format!("parse error: {e}")))
    }

    fn token_data(&self, response: &OutlookTokenResponse) -> TokenData {
        TokenData {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
            scopes: self.scope.clone(),
            provider: self.client.clone(),
        }
    }
}

#[async_trait]
impl OAuth2Handler for OutlookHandler {
    async fn authorize(&self, relay: &str) -> Result<String, HandlerError> {
        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&response_mode=query&scope={}",
            self.authorize_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scope),
        );
        if !relay.is_empty() {
            url.push_str(&format!("&state={}", urlencoding::encode(relay)));
        }
        Ok(url)
    }

    fn authenticate_param_keys(&self) -> &'static [&'static str] {
        AUTHENTICATE_PARAM_KEYS
    }

    fn verify_authenticate_params(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<(), HandlerError> {
        if let Some(error) = params.get(query::ERROR) {
            return Err(HandlerError::PermissionDenied(format!(
                "authorization was rejected: {error}"
            )));
        }
        if !params.contains_key(query::CODE) {
            return Err(HandlerError::invalid_request(
                "the authorization code is missing",
            ));
        }
        Ok(())
    }

    async fn authenticate(&self, info: &OAuthInfo) -> Result<(), HandlerError> {
        let code = info
            .param(query::CODE)
            .ok_or_else(|| HandlerError::invalid_request("the authorization code is missing"))?;
        let session = info
            .session_token
            .as_deref()
            .ok_or_else(|| HandlerError::invalid_request("no host session token"))?;

        let response = self
            .exchange(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("scope", self.scope.as_str()),
                ("code", code),
            ])
            .await?;

        let id_token = response.id_token.as_deref().ok_or_else(|| {
            HandlerError::failed("token_exchange_failed", "token response has no id_token")
        })?;
        let username = id_token_account(id_token)?;

        debug!("exchanged credential for {} account {username}", self.client);
        self.store
            .save(session, &username, &self.token_data(&response))
            .await
    }

    async fn refresh(&self, info: &OAuthInfo) -> Result<bool, HandlerError> {
        let username = info
            .username
            .as_deref()
            .ok_or_else(|| HandlerError::invalid_request("a username is required to refresh"))?;
        let session = info
            .session_token
            .as_deref()
            .ok_or_else(|| HandlerError::invalid_request("no host session token"))?;

        let Some(stored) = self.store.stored_refresh_token(&self.client, username).await? else {
            return Err(HandlerError::invalid_request(format!(
                "no stored credential for {username}"
            )));
        };

        let response = self
            .exchange(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("scope", self.scope.as_str()),
                ("refresh_token", stored.as_str()),
            ])
            .await?;

        self.store
            .save(session, username, &self.token_data(&response))
            .await?;
        Ok(true)
    }

    fn relay(&self, params: &HashMap<String, String>) -> String {
        params.get(query::STATE).cloned().unwrap_or_default()
    }
}
