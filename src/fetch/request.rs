//! HTTP request building.
//!
//! This module provides utilities for constructing realistic HTTP requests
//! against the archive.

use rand::seq::IndexedRandom;
use reqwest::header::{HeaderName, HeaderValue, USER_AGENT};

use crate::config::{BROWSER_HEADERS, USER_AGENTS};

/// Realistic browser request headers to reduce bot detection.
///
/// The archive throttles traffic that looks automated. Each request gets the
/// static browser header set plus a User-Agent picked at random from the pool,
/// so consecutive attempts do not share a fingerprint.
pub(crate) struct RequestHeaders;

impl RequestHeaders {
    /// Picks a User-Agent from the pool.
    pub(crate) fn random_user_agent() -> &'static str {
        USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    /// Applies the browser headers and a random User-Agent to a request.
    pub(crate) fn apply_to_request_builder(
        builder: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        let builder = BROWSER_HEADERS
            .iter()
            .fold(builder, |builder, &(name, value)| {
                builder.header(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                )
            });
        builder.header(USER_AGENT, Self::random_user_agent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_from_pool() {
        for _ in 0..50 {
            assert!(USER_AGENTS.contains(&RequestHeaders::random_user_agent()));
        }
    }

    #[test]
    fn test_apply_headers() {
        let client = reqwest::Client::new();
        let request =
            RequestHeaders::apply_to_request_builder(client.get("http://example.com/"))
                .build()
                .unwrap();
        let headers = request.headers();
        assert_eq!(headers.get("dnt").unwrap(), "1");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(headers.get("accept-language").unwrap(), "en-US,en;q=0.9");
        let ua = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(USER_AGENTS.contains(&ua));
    }
}
