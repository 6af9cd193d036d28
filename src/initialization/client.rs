//! HTTP client initialization.
//!
//! This module provides functions to initialize HTTP clients with proper
//! configuration for archive requests and redirect inspection.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::Config;

/// Initializes the HTTP client used for CDX queries and snapshot bodies.
///
/// Creates a `reqwest::Client` configured with:
/// - Timeout from the configuration (backstop for the per-request deadline)
/// - Redirect following enabled (up to 10 hops)
/// - Transparent gzip/brotli/deflate decoding
///
/// The User-Agent is chosen per request from the browser pool, so the client
/// carries none.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    Ok(Arc::new(client))
}

/// Initializes the HTTP client used to classify archived redirects.
///
/// Redirects are disabled so the archived `3xx` status and its `Location`
/// header reach the classifier untouched.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_redirect_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()?;
    Ok(Arc::new(client))
}
