//! Error categorization and retry strategy.
//!
//! This module provides functions to categorize errors and configure retry strategies.

use std::time::Duration;

use super::stats::ProcessingStats;
use super::types::{ErrorType, FetchError};
use crate::config::Config;
use crate::utils::JitteredBackoff;

/// Creates the jittered backoff retry strategy for archive requests.
///
/// Yields one delay per retry, so a request gets `config.max_retries` attempts
/// in total (initial attempt included). Delays start around
/// `initial_backoff_ms * 1.5` and never exceed `max_backoff_ms`.
pub fn get_retry_strategy(config: &Config) -> impl Iterator<Item = Duration> {
    JitteredBackoff::new(
        Duration::from_millis(config.initial_backoff_ms),
        Duration::from_millis(config.max_backoff_ms),
    )
    .take(config.max_retries.saturating_sub(1))
}

/// Categorizes a `reqwest::Error` into an `ErrorType`.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ErrorType {
    if let Some(status) = error.status() {
        return categorize_status(status.as_u16());
    }

    if error.is_timeout() {
        ErrorType::HttpRequestTimeoutError
    } else if error.is_connect() {
        ErrorType::HttpRequestConnectError
    } else if error.is_body() {
        ErrorType::HttpRequestBodyError
    } else if error.is_decode() {
        ErrorType::HttpRequestDecodeError
    } else {
        ErrorType::HttpRequestOtherError
    }
}

fn categorize_status(status: u16) -> ErrorType {
    match status {
        429 => ErrorType::HttpRequestTooManyRequests,
        503 => ErrorType::HttpRequestServiceUnavailable,
        504 => ErrorType::HttpRequestGatewayTimeout,
        _ => ErrorType::HttpRequestStatusError,
    }
}

/// Categorizes a [`FetchError`] into an `ErrorType`.
///
/// Exhausted retries are reported as such; the last attempt's cause is
/// available through the error source chain if needed.
pub fn categorize_fetch_error(error: &FetchError) -> ErrorType {
    match error {
        FetchError::Timeout => ErrorType::HttpRequestTimeoutError,
        FetchError::Status(status) => categorize_status(*status),
        FetchError::Request(e) => categorize_reqwest_error(e),
        FetchError::Decode(_) => ErrorType::HttpRequestDecodeError,
        FetchError::RetriesExhausted { .. } => ErrorType::RetriesExhausted,
    }
}

/// Updates processing statistics based on a [`FetchError`].
pub fn update_error_stats(stats: &ProcessingStats, error: &FetchError) {
    stats.increment_error(categorize_fetch_error(error));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> Config {
        Config {
            initial_backoff_ms: 100,
            max_backoff_ms: 1000,
            max_retries: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_get_retry_strategy_max_attempts() {
        // 5 attempts means 4 sleeps in between
        assert_eq!(get_retry_strategy(&fast_config()).count(), 4);

        let single = Config {
            max_retries: 1,
            ..fast_config()
        };
        assert_eq!(get_retry_strategy(&single).count(), 0);
    }

    #[test]
    fn test_get_retry_strategy_bounds() {
        let delays: Vec<Duration> = get_retry_strategy(&fast_config()).collect();
        // First delay: 100 * 1.5 * [1.0, 1.2)
        assert!(delays[0] >= Duration::from_millis(150));
        assert!(delays[0] < Duration::from_millis(180));
        for pair in delays.windows(2) {
            assert!(pair[1] >= pair[0], "Delay should not decrease: {:?}", pair);
        }
        for delay in delays {
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_categorize_fetch_error() {
        assert_eq!(
            categorize_fetch_error(&FetchError::Timeout),
            ErrorType::HttpRequestTimeoutError
        );
        assert_eq!(
            categorize_fetch_error(&FetchError::Status(429)),
            ErrorType::HttpRequestTooManyRequests
        );
        assert_eq!(
            categorize_fetch_error(&FetchError::Status(503)),
            ErrorType::HttpRequestServiceUnavailable
        );
        assert_eq!(
            categorize_fetch_error(&FetchError::Status(404)),
            ErrorType::HttpRequestStatusError
        );
        assert_eq!(
            categorize_fetch_error(&FetchError::RetriesExhausted {
                attempts: 5,
                source: Box::new(FetchError::Timeout),
            }),
            ErrorType::RetriesExhausted
        );
    }

    #[test]
    fn test_update_error_stats() {
        let stats = ProcessingStats::new();
        update_error_stats(&stats, &FetchError::Timeout);
        update_error_stats(&stats, &FetchError::Timeout);
        update_error_stats(&stats, &FetchError::Status(504));
        assert_eq!(stats.get_error_count(ErrorType::HttpRequestTimeoutError), 2);
        assert_eq!(stats.get_error_count(ErrorType::HttpRequestGatewayTimeout), 1);
    }
}
