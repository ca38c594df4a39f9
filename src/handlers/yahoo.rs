// ABOUTME: Yahoo OAuth2 handler for the authorization-code flow
// ABOUTME: Basic-auth token endpoint; the account GUID comes back with the token response
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use super::config_key;
use crate::config::Configuration;
use crate::constants::query;
use crate::errors::{BrokerError, HandlerError};
use crate::models::{OAuthInfo, TokenData};
use crate::oauth::{CredentialStore, HandlerFactory, OAuth2Handler};

/// Implementation identifier selected by `classes.handlers.<client>`.
pub const HANDLER_ID: &str = "yahoo";

const AUTHORIZE_ENDPOINT: &str = "https://api.login.yahoo.com/oauth2/request_auth";
const TOKEN_ENDPOINT: &str = "https://api.login.yahoo.com/oauth2/get_token";
const DEFAULT_SCOPE: &str = "mail-r";

/// Callback parameters Yahoo sends to the redirect URI.
const AUTHENTICATE_PARAM_KEYS: &[&str] = &[query::CODE, query::ERROR, query::STATE];

/// Yahoo token endpoint response.
#[derive(Debug, Deserialize)]
struct YahooTokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    /// Account GUID; present on both code exchange and refresh.
    #[serde(default)]
    xoauth_yahoo_guid: Option<String>,
}

/// Factory registered under [`HANDLER_ID`].
pub struct YahooHandlerFactory;

impl HandlerFactory for YahooHandlerFactory {
    fn create(
        &self,
        config: &Configuration,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Arc<dyn OAuth2Handler>, BrokerError> {
        Ok(Arc::new(YahooHandler::from_config(config, store)?))
    }
}

/// OAuth2 handler for Yahoo mail accounts.
pub struct YahooHandler {
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

impl std::fmt::Debug for YahooHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooHandler")
            .field("client", &self.client)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("authorize_endpoint", &self.authorize_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .finish_non_exhaustive()
    }
}

impl YahooHandler {
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

    /// POST to the token endpoint with client credentials in a Basic header.
    async fn exchange(&self, form: &[(&str, &str)]) -> Result<YahooTokenResponse, HandlerError> {
        let basic = general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .http
            .post(&self.token_endpoint)
            .header("Authorization", format!("Basic {basic}"))
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

    fn token_data(&self, response: &YahooTokenResponse) -> TokenData {
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
impl OAuth2Handler for YahooHandler {
    async fn authorize(&self, relay: &str) -> Result<String, HandlerError> {
        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code",
            self.authorize_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
        );
        if !self.scope.is_empty() {
            url.push_str(&format!("&scope={}", urlencoding::encode(&self.scope)));
        }
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
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
            ])
            .await?;

        let username = response.xoauth_yahoo_guid.clone().ok_or_else(|| {
            HandlerError::failed(
                "token_exchange_failed",
                "token response is missing the account guid",
            )
        })?;

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

        let Some(refresh_token) = self.store.stored_refresh_token(&self.client, username).await?
        else {
            return Err(HandlerError::invalid_request(format!(
                "no stored credential for {username}"
            )));
        };

        let response = self
            .exchange(&[
                ("grant_type", "refresh_token"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("refresh_token", refresh_token.as_str()),
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
