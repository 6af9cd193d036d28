//! Resilient archive requests.
//!
//! `fetch_with_retry` is the only path that retries: CDX pages and anything
//! else that must eventually succeed. `fetch_once` is the single-shot variant
//! used for snapshot bodies, where a failure simply means "no result".

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::debug;
use tokio_retry::RetryIf;

use super::request::RequestHeaders;
use super::response::CachedResponse;
use crate::context::HistoryContext;
use crate::error_handling::{get_retry_strategy, update_error_stats, ErrorType, FetchError, InfoType};
use crate::utils::request_jitter;

/// Fetches `url`, retrying with jittered backoff until a response with one of
/// the `acceptable` status codes arrives.
///
/// A cached response under `cache_key` is returned without any network I/O.
/// Successful responses are stored under `cache_key` for `ttl_secs`.
///
/// # Errors
///
/// Returns `FetchError::RetriesExhausted` once every attempt has failed with a
/// transient error, or the first non-retriable error as is.
pub async fn fetch_with_retry(
    ctx: &HistoryContext,
    url: &str,
    acceptable: &[u16],
    cache_key: Option<&str>,
    ttl_secs: Option<u64>,
) -> Result<CachedResponse, FetchError> {
    if let Some(cached) = cache_key.and_then(|key| ctx.cache.responses.get(key)) {
        debug!("Cache hit for {}", url);
        ctx.stats.increment_info(InfoType::CacheHit);
        return Ok(cached);
    }

    let max_attempts = ctx.config.max_retries.max(1);
    let attempts = AtomicUsize::new(0);
    let counter = &attempts;

    let result = RetryIf::spawn(
        get_retry_strategy(&ctx.config),
        move || async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let outcome = attempt_request(ctx, url, acceptable).await;
            if let Err(e) = &outcome {
                debug!(
                    "Attempt {}/{} for {} failed: {}",
                    attempt, max_attempts, url, e
                );
            }
            outcome
        },
        |e: &FetchError| e.is_retriable(),
    )
    .await;

    match result {
        Ok(response) => {
            if let Some(key) = cache_key {
                ctx.cache.responses.set(key, response.clone(), ttl_secs);
            }
            Ok(response)
        }
        Err(e) if e.is_retriable() => {
            ctx.stats.increment_error(ErrorType::RetriesExhausted);
            Err(FetchError::RetriesExhausted {
                attempts: attempts.load(Ordering::SeqCst),
                source: Box::new(e),
            })
        }
        Err(e) => Err(e),
    }
}

/// One attempt: jitter, request under the configured deadline, status check.
///
/// Feeds the outcome into the health monitor and the error counters.
async fn attempt_request(
    ctx: &HistoryContext,
    url: &str,
    acceptable: &[u16],
) -> Result<CachedResponse, FetchError> {
    tokio::time::sleep(request_jitter(ctx.config.request_jitter_max_ms)).await;

    let deadline = Duration::from_millis(ctx.config.request_timeout_ms);
    let result = fetch_once(&ctx.client, url, deadline)
        .await
        .and_then(|response| {
            if acceptable.contains(&response.status) {
                Ok(response)
            } else {
                Err(FetchError::Status(response.status))
            }
        });

    match &result {
        Ok(_) => ctx.health.record_success(),
        Err(e) => {
            ctx.health.record_error();
            update_error_stats(&ctx.stats, e);
        }
    }
    result
}

/// Single GET with browser headers, fully buffered, bounded by `deadline`.
///
/// Any status is returned as a response; only transport failures and the
/// deadline are errors. Does not touch the health monitor.
pub async fn fetch_once(
    client: &reqwest::Client,
    url: &str,
    deadline: Duration,
) -> Result<CachedResponse, FetchError> {
    let request = RequestHeaders::apply_to_request_builder(client.get(url));
    let fetch = async {
        let response = request.send().await?;
        CachedResponse::from_response(response).await
    };

    match tokio::time::timeout(deadline, fetch).await {
        Ok(Err(FetchError::Request(e))) if e.is_timeout() => Err(FetchError::Timeout),
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn fast_ctx(server: &Server) -> HistoryContext {
        HistoryContext::new(Config {
            archive_base_url: server.url_str(""),
            max_retries: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            request_jitter_max_ms: 0,
            request_timeout_ms: 2000,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_with_retry_success_is_cached() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/cdx"))
                .times(1)
                .respond_with(json_encoded(serde_json::json!([["timestamp"]]))),
        );
        let ctx = fast_ctx(&server);
        let url = server.url_str("/cdx");

        let first = fetch_with_retry(&ctx, &url, &[200], Some("page:test"), Some(60))
            .await
            .unwrap();
        assert!(first.is_ok());
        assert_eq!(first.json().unwrap()[0][0], "timestamp");

        // Second call is served from cache; the server only expects one hit
        let second = fetch_with_retry(&ctx, &url, &[200], Some("page:test"), Some(60))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.stats.get_info_count(InfoType::CacheHit), 1);
        assert_eq!(ctx.health.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_fetch_with_retry_recovers_after_failures() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/flaky"))
                .times(3)
                .respond_with(httptest::cycle![
                    status_code(503),
                    status_code(503),
                    status_code(200).body("fine"),
                ]),
        );
        let ctx = fast_ctx(&server);

        let response = fetch_with_retry(&ctx, &server.url_str("/flaky"), &[200], None, None)
            .await
            .unwrap();
        assert_eq!(response.text(), "fine");
        assert_eq!(
            ctx.stats.get_error_count(ErrorType::HttpRequestServiceUnavailable),
            2
        );
        // The final success resets the failure streak
        assert_eq!(ctx.health.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_fetch_with_retry_exhausts_attempts() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/down"))
                .times(3)
                .respond_with(status_code(500)),
        );
        let ctx = fast_ctx(&server);

        let err = fetch_with_retry(&ctx, &server.url_str("/down"), &[200], Some("k"), None)
            .await
            .unwrap_err();
        match &err {
            FetchError::RetriesExhausted { attempts, .. } => assert_eq!(*attempts, 3),
            other => panic!("Expected RetriesExhausted, got {:?}", other),
        }
        assert!(err.to_string().starts_with("Failed after 3 attempts"));
        assert_eq!(ctx.health.consecutive_failures(), 3);
        assert_eq!(ctx.stats.get_error_count(ErrorType::RetriesExhausted), 1);
        assert!(!ctx.cache.responses.has("k"));
    }

    #[tokio::test]
    async fn test_fetch_with_retry_accepts_custom_statuses() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/missing"))
                .times(1)
                .respond_with(status_code(404).body("gone")),
        );
        let ctx = fast_ctx(&server);
        let response = fetch_with_retry(&ctx, &server.url_str("/missing"), &[200, 404], None, None)
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_fetch_once_times_out() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/slow")).respond_with(
                delay_and_then(Duration::from_millis(500), status_code(200)),
            ),
        );
        let client = reqwest::Client::new();
        let err = fetch_once(&client, &server.url_str("/slow"), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_once_returns_any_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/moved")).respond_with(
                status_code(301).insert_header("Location", "https://new.example.com/"),
            ),
        );
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let response = fetch_once(&client, &server.url_str("/moved"), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(response.status, 301);
        assert_eq!(response.location(), Some("https://new.example.com/"));
    }
}
