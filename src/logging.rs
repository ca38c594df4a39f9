// ABOUTME: Structured logging setup built on tracing and tracing-subscriber
// ABOUTME: Host applications call init once at startup; tests may call it repeatedly
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`, defaulting to `info`. Safe to call more than once;
/// later calls are no-ops so tests can initialize unconditionally.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
