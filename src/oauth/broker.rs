// ABOUTME: Request-level orchestration of the authorize, authenticate, and refresh flows
// ABOUTME: Folds handler failures into the uniform error/redirect contract
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::relay;
use super::HandlerRegistry;
use crate::constants::{error_codes, INVALID_SESSION_MSG};
use crate::errors::{BrokerResult, HandlerError};
use crate::models::{ErrorParams, OAuthInfo, ResponseObject};

/// The broker's produced interface, consumed by the host HTTP layer.
///
/// Holds the long-lived [`HandlerRegistry`]; one instance serves all
/// concurrent requests.
pub struct OAuthBroker {
    registry: Arc<HandlerRegistry>,
}

impl OAuthBroker {
    /// Broker over the given registry.
    #[must_use]
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Start the flow: the provider's authorization-endpoint redirect URL.
    ///
    /// Registry and handler failures propagate unchanged: the caller has
    /// not yet round-tripped to the provider, so no redirect contract
    /// applies.
    pub async fn authorize(&self, client: &str, relay: &str) -> BrokerResult<String> {
        let handler = self.registry.handler(client).await?;
        Ok(handler.authorize(relay).await?)
    }

    /// Complete the flow from the provider's redirect callback.
    ///
    /// Runs the strict sequence: extract expected parameters, verify them
    /// with the handler, check the host session, exchange the code. Every
    /// failure past handler resolution is converted into `error`/`error_msg`
    /// query parameters on the returned redirect URL, so the user always gets
    /// a redirect, never a raw error. The relay is resolved on failure paths
    /// too, since where to send the user is independent of the auth outcome.
    pub async fn authenticate(
        &self,
        client: &str,
        query_params: &HashMap<String, Vec<String>>,
        session_token: Option<&str>,
    ) -> BrokerResult<String> {
        let handler = self.registry.handler(client).await?;
        let params = expected_params(handler.authenticate_param_keys(), query_params);

        let mut errors = ErrorParams::default();

        if let Err(failure) = handler.verify_authenticate_params(&params) {
            debug!(client, error = %failure, "callback parameter verification failed");
            match failure {
                HandlerError::PermissionDenied(message) => {
                    errors.set(error_codes::ACCESS_DENIED, Some(message));
                }
                // invalid params pass their own code through, without detail
                HandlerError::Failed { code, .. } => errors.set(code, None),
            }
        }

        if errors.is_empty() {
            // without a host session there is no account to attach the new
            // credential to
            match session_token.filter(|token| !token.is_empty()) {
                None => errors.set(
                    error_codes::INVALID_SESSION,
                    Some(INVALID_SESSION_MSG.to_owned()),
                ),
                Some(token) => {
                    let mut info = OAuthInfo::new(params.clone());
                    info.session_token = Some(token.to_owned());
                    if let Err(failure) = handler.authenticate(&info).await {
                        debug!(client, error = %failure, "authentication failed");
                        match failure {
                            // no detail on authorization failures, to avoid
                            // echoing provider internals
                            HandlerError::PermissionDenied(_) => {
                                errors.set(error_codes::ACCESS_DENIED, None);
                            }
                            HandlerError::Failed { message, .. } => {
                                errors.set(error_codes::AUTHENTICATION_ERROR, Some(message));
                            }
                        }
                    }
                }
            }
        }

        let target = handler.relay(&params);
        Ok(relay::add_query_params(
            &relay::validated_relay(&target),
            &errors.as_pairs(),
        ))
    }

    /// Re-validate an existing credential, server-to-server.
    ///
    /// No query extraction and no redirect semantics: the result is always a
    /// structured envelope, and handler failures propagate as errors.
    pub async fn refresh(
        &self,
        client: &str,
        username: &str,
        session_token: &str,
    ) -> BrokerResult<ResponseObject<bool>> {
        let handler = self.registry.handler(client).await?;
        let info = OAuthInfo {
            client_id: Some(client.to_owned()),
            username: Some(username.to_owned()),
            session_token: Some(session_token.to_owned()),
            ..OAuthInfo::default()
        };
        Ok(ResponseObject::new(handler.refresh(&info).await?))
    }
}

/// Filter the full multi-valued query mapping down to the keys the handler
/// expects, first value wins. Absent keys are omitted, not an error.
fn expected_params(
    expected: &[&str],
    query_params: &HashMap<String, Vec<String>>,
) -> HashMap<String, String> {
    let mut found = HashMap::with_capacity(expected.len());
    for key in expected {
        if let Some(first) = query_params.get(*key).and_then(|values| values.first()) {
            found.insert((*key).to_owned(), first.clone());
        }
    }
    found
}
