// ABOUTME: Integration tests for lazy handler construction and caching
// ABOUTME: Verifies single construction under concurrency and the failure-mapping contract
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{registry_with, FailingFactory, MemoryStore, ScriptedFactory, ScriptedHandler};
use oauth_broker::config::StaticConfigResolver;
use oauth_broker::oauth::HandlerFactory;
use oauth_broker::{BrokerError, HandlerRegistry};

#[tokio::test]
async fn concurrent_first_use_constructs_exactly_once() {
    let (factory, builds) = ScriptedFactory::new(ScriptedHandler::ok());
    let registry = Arc::new(registry_with("mock", "scripted", Box::new(factory)));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.handler("mock").await })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cached_handler_is_reused_across_calls() {
    let (factory, builds) = ScriptedFactory::new(ScriptedHandler::ok());
    let registry = registry_with("mock", "scripted", Box::new(factory));

    let first = registry.handler("mock").await.unwrap();
    let second = registry.handler("mock").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn distinct_clients_get_distinct_constructions() {
    let (factory, builds) = ScriptedFactory::new(ScriptedHandler::ok());
    let resolver = StaticConfigResolver::new()
        .with_client(
            "alpha",
            HashMap::from([("classes.handlers.alpha".to_owned(), "scripted".to_owned())]),
        )
        .with_client(
            "beta",
            HashMap::from([("classes.handlers.beta".to_owned(), "scripted".to_owned())]),
        );
    let mut factories: HashMap<&'static str, Box<dyn HandlerFactory>> = HashMap::new();
    factories.insert("scripted", Box::new(factory));
    let registry = HandlerRegistry::with_factories(
        Arc::new(resolver),
        Arc::new(MemoryStore::default()),
        factories,
    );

    registry.handler("alpha").await.unwrap();
    registry.handler("beta").await.unwrap();
    registry.handler("alpha").await.unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_client_is_an_invalid_client_error() {
    let (factory, _) = ScriptedFactory::new(ScriptedHandler::ok());
    let registry = registry_with("mock", "scripted", Box::new(factory));

    let err = registry.handler("myspace").await.unwrap_err();
    assert!(matches!(err, BrokerError::InvalidClient(_)));
}

#[tokio::test]
async fn unknown_implementation_maps_to_configuration_error() {
    // client resolves, but names an implementation nothing registered
    let resolver = StaticConfigResolver::new().with_client(
        "mock",
        HashMap::from([("classes.handlers.mock".to_owned(), "missing".to_owned())]),
    );
    let registry = HandlerRegistry::with_factories(
        Arc::new(resolver),
        Arc::new(MemoryStore::default()),
        HashMap::new(),
    );

    let err = registry.handler("mock").await.unwrap_err();
    assert!(matches!(err, BrokerError::Configuration(_)));
}

#[tokio::test]
async fn missing_implementation_key_maps_to_configuration_error() {
    let resolver = StaticConfigResolver::new().with_client("mock", HashMap::new());
    let registry = HandlerRegistry::with_factories(
        Arc::new(resolver),
        Arc::new(MemoryStore::default()),
        HashMap::new(),
    );

    let err = registry.handler("mock").await.unwrap_err();
    assert!(matches!(err, BrokerError::Configuration(_)));
}

#[tokio::test]
async fn factory_failure_is_wrapped_as_configuration_error() {
    let registry = registry_with("mock", "scripted", Box::new(FailingFactory));

    let err = registry.handler("mock").await.unwrap_err();
    match err {
        BrokerError::Configuration(message) => {
            // the wrapped message names the client, not the raw cause
            assert!(message.contains("mock"));
            assert!(!message.contains("constructor blew up"));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_construction_is_not_cached() {
    let registry = registry_with("mock", "scripted", Box::new(FailingFactory));

    assert!(registry.handler("mock").await.is_err());
    // still fails (and still consults the factory) rather than caching a ghost
    assert!(registry.handler("mock").await.is_err());
}
