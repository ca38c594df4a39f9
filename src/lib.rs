// ABOUTME: Library entry point for the multi-provider OAuth2 credential broker
// ABOUTME: Exposes the broker, handler registry, configuration contract, and provider handlers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![deny(unsafe_code)]

//! # OAuth Broker
//!
//! A credential broker that mediates the OAuth2 authorization-code flow for
//! multiple third-party identity providers (Yahoo, Google, Outlook) behind a
//! single authenticate/refresh contract. A host application, typically a
//! webmail server that attaches external-account credentials to a signed-in
//! account, drives the broker from its own HTTP layer.
//!
//! ## Architecture
//!
//! - **Handlers**: one [`oauth::OAuth2Handler`] implementation per provider,
//!   built lazily from configuration and cached for the process lifetime
//! - **Registry**: [`HandlerRegistry`] resolves a client identifier to its
//!   singleton handler, constructing at most one instance per client even
//!   under concurrent first use
//! - **Broker**: [`OAuthBroker`] sequences parameter extraction, provider
//!   validation, session checks, and token exchange, and folds every failure
//!   into the uniform `error`/`error_msg` redirect contract
//! - **Config**: [`config::ConfigResolver`] supplies an immutable per-client
//!   key/value view; an environment-backed resolver is included
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use oauth_broker::config::EnvConfigResolver;
//! use oauth_broker::models::TokenData;
//! use oauth_broker::{CredentialStore, HandlerError, HandlerRegistry, OAuthBroker};
//!
//! struct MailboxStore;
//!
//! #[async_trait]
//! impl CredentialStore for MailboxStore {
//!     async fn save(
//!         &self,
//!         _session_token: &str,
//!         _username: &str,
//!         _token: &TokenData,
//!     ) -> Result<(), HandlerError> {
//!         Ok(())
//!     }
//!
//!     async fn stored_refresh_token(
//!         &self,
//!         _provider: &str,
//!         _username: &str,
//!     ) -> Result<Option<String>, HandlerError> {
//!         Ok(None)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), oauth_broker::BrokerError> {
//!     let registry = HandlerRegistry::new(
//!         Arc::new(EnvConfigResolver::from_env()),
//!         Arc::new(MailboxStore),
//!     );
//!     let broker = OAuthBroker::new(Arc::new(registry));
//!     let redirect = broker.authorize("yahoo", "/mail").await?;
//!     println!("send the user to {redirect}");
//!     Ok(())
//! }
//! ```

/// Configuration contract and resolvers
pub mod config;

/// Application constants: query parameter names, error codes, client identifiers
pub mod constants;

/// Error types for the broker and handler layers
pub mod errors;

/// Concrete per-provider OAuth2 handlers
pub mod handlers;

/// Structured logging setup
pub mod logging;

/// Shared data model: auth info, token data, response envelopes
pub mod models;

/// Broker orchestration, handler registry, and redirect utilities
pub mod oauth;

pub use errors::{BrokerError, BrokerResult, HandlerError};
pub use oauth::{CredentialStore, HandlerRegistry, OAuth2Handler, OAuthBroker};
