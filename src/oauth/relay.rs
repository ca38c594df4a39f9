// ABOUTME: Relay validation and query-parameter building for post-flow redirects
// ABOUTME: Only relative targets are trusted; malformed input fails open to safe defaults
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use tracing::{info, warn};
use url::{ParseError, Position, Url};

use crate::constants::DEFAULT_SUCCESS_REDIRECT;

/// Base used to parse and re-serialize relative targets.
const PLACEHOLDER_BASE: &str = "http://relay.invalid/";

/// Validate a relay target, falling back to the default success redirect.
///
/// The relay must percent-decode cleanly and parse as a *relative* URL:
/// absolute targets and authority-carrying relatives (`//host/...`) would
/// turn the relay parameter into an open redirect, so they are replaced by
/// [`DEFAULT_SUCCESS_REDIRECT`]. A valid relative target is returned
/// decoded, otherwise unchanged.
#[must_use]
pub fn validated_relay(url: &str) -> String {
    if url.is_empty() {
        return DEFAULT_SUCCESS_REDIRECT.to_owned();
    }

    let decoded = match urlencoding::decode(url) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            info!("unable to decode relay parameter");
            return DEFAULT_SUCCESS_REDIRECT.to_owned();
        }
    };

    match Url::parse(&decoded) {
        // parsed on its own means it carries a scheme: not a relative target
        Ok(_) => {
            info!("absolute relay target rejected");
            DEFAULT_SUCCESS_REDIRECT.to_owned()
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            let Ok(base) = Url::parse(PLACEHOLDER_BASE) else {
                return DEFAULT_SUCCESS_REDIRECT.to_owned();
            };
            match base.join(&decoded) {
                // the join must stay on the placeholder host, or the relay
                // smuggled in an authority
                Ok(joined) if joined.host_str() == Some("relay.invalid") => decoded,
                Ok(_) => {
                    info!("protocol-relative relay target rejected");
                    DEFAULT_SUCCESS_REDIRECT.to_owned()
                }
                Err(_) => {
                    info!("invalid relay URI syntax found");
                    DEFAULT_SUCCESS_REDIRECT.to_owned()
                }
            }
        }
        Err(_) => {
            info!("invalid relay URI syntax found");
            DEFAULT_SUCCESS_REDIRECT.to_owned()
        }
    }
}

/// Append query parameters to a path without corrupting existing structure.
///
/// Empty path or empty params is a no-op; pairs with an empty key or value
/// are skipped. On any URI failure the original path is returned unchanged;
/// the caller must always receive a usable path, so this never errors.
#[must_use]
pub fn add_query_params(path: &str, params: &[(&str, &str)]) -> String {
    if path.is_empty() || params.is_empty() {
        return path.to_owned();
    }

    let pairs: Vec<(&str, &str)> = params
        .iter()
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .copied()
        .collect();
    if pairs.is_empty() {
        return path.to_owned();
    }

    match Url::parse(path) {
        // already absolute: append in place and keep the full URL
        Ok(mut absolute) => {
            append_pairs(&mut absolute, &pairs);
            absolute.to_string()
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            let Ok(base) = Url::parse(PLACEHOLDER_BASE) else {
                return path.to_owned();
            };
            match base.join(path) {
                Ok(mut joined) => {
                    append_pairs(&mut joined, &pairs);
                    let serialized = joined[Position::BeforePath..].to_owned();
                    // joining adds a leading slash; keep rootless paths rootless
                    if path.starts_with('/') {
                        serialized
                    } else {
                        match serialized.strip_prefix('/') {
                            Some(rootless) => rootless.to_owned(),
                            None => serialized,
                        }
                    }
                }
                Err(_) => {
                    warn!("there was an issue adding query parameters to the path: {path}");
                    path.to_owned()
                }
            }
        }
        Err(_) => {
            warn!("there was an issue adding query parameters to the path: {path}");
            path.to_owned()
        }
    }
}

fn append_pairs(url: &mut Url, pairs: &[(&str, &str)]) {
    let mut serializer = url.query_pairs_mut();
    for &(key, value) in pairs {
        serializer.append_pair(key, value);
    }
}
