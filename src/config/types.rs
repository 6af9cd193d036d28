//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    ARCHIVE_BASE_URL, CACHE_DEFAULT_TTL_SECONDS, CDX_PAGE_SIZE, CLIENT_SIDE_TIMEOUT_MS,
    HEALTH_PAUSE_SECS, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_CHUNK_SIZE,
    MAX_CONCURRENT_REQUESTS, MAX_RETRIES, MAX_SNAPSHOTS_TO_CHECK, NEGATIVE_CACHE_TTL_SECONDS,
    PAGE_ERROR_DELAY_MS, PAGE_FETCH_DELAY_MS, REQUEST_DELAY_MS, REQUEST_JITTER_MAX_MS,
    REQUEST_TIMEOUT_MS, TITLE_CACHE_TTL_SECONDS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// Every pacing knob is a field so callers (and tests) can shrink the delays
/// that protect the public archive.
///
/// # Examples
///
/// ```no_run
/// use wayback_redirects::Config;
///
/// let config = Config {
///     include_titles: true,
///     max_snapshots_per_check: Some(50),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Archive host; CDX and snapshot URLs are built on it
    pub archive_base_url: String,

    /// Total attempts per resilient request
    pub max_retries: usize,

    /// Backoff seed in milliseconds
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds
    pub max_backoff_ms: u64,

    /// Deadline for a single archive request
    pub request_timeout_ms: u64,

    /// Deadline for fetching a 200 snapshot body
    pub client_side_timeout_ms: u64,

    /// Upper bound of the pre-request jitter
    pub request_jitter_max_ms: u64,

    /// Executor concurrency cap
    pub max_concurrent_requests: usize,

    /// Executor base inter-task delay
    pub request_delay_ms: u64,

    /// Per-variant snapshot cap for CDX retrieval
    pub max_snapshots_to_check: usize,

    /// Most recent 200/page snapshots inspected per check (`None` = all)
    pub max_snapshots_per_check: Option<usize>,

    /// Render the PAGE TITLES section
    pub include_titles: bool,

    /// CDX rows per page
    pub cdx_page_size: usize,

    /// Pause between CDX pages
    pub page_fetch_delay_ms: u64,

    /// Extra pause after a failed page while the network is unhealthy
    pub page_error_delay_ms: u64,

    /// Cooldown applied when the health monitor trips
    pub health_pause_secs: u64,

    /// Maximum characters per report chunk
    pub max_chunk_size: usize,

    /// TTL for positive cache entries
    pub cache_ttl_secs: u64,

    /// TTL for negative cache entries
    pub negative_cache_ttl_secs: u64,

    /// TTL for extracted titles
    pub title_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_base_url: ARCHIVE_BASE_URL.to_string(),
            max_retries: MAX_RETRIES,
            initial_backoff_ms: INITIAL_BACKOFF_MS,
            max_backoff_ms: MAX_BACKOFF_MS,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            client_side_timeout_ms: CLIENT_SIDE_TIMEOUT_MS,
            request_jitter_max_ms: REQUEST_JITTER_MAX_MS,
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
            request_delay_ms: REQUEST_DELAY_MS,
            max_snapshots_to_check: MAX_SNAPSHOTS_TO_CHECK,
            max_snapshots_per_check: None,
            include_titles: false,
            cdx_page_size: CDX_PAGE_SIZE,
            page_fetch_delay_ms: PAGE_FETCH_DELAY_MS,
            page_error_delay_ms: PAGE_ERROR_DELAY_MS,
            health_pause_secs: HEALTH_PAUSE_SECS,
            max_chunk_size: MAX_CHUNK_SIZE,
            cache_ttl_secs: CACHE_DEFAULT_TTL_SECONDS,
            negative_cache_ttl_secs: NEGATIVE_CACHE_TTL_SECONDS,
            title_cache_ttl_secs: TITLE_CACHE_TTL_SECONDS,
        }
    }
}

impl Config {
    /// Archive base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.archive_base_url.trim_end_matches('/')
    }
}

/// Command-line options for the `wayback_redirects` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wayback_redirects",
    about = "Reconstructs a domain's redirect history from the Wayback Machine."
)]
pub struct Opt {
    /// Domains to check (ignored with --serve)
    pub domains: Vec<String>,

    /// Serve the JSON API on this port instead of checking domains
    #[arg(long)]
    pub serve: Option<u16>,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Add the PAGE TITLES section
    #[arg(long)]
    pub include_titles: bool,

    /// Only inspect the N most recent page snapshots
    #[arg(long)]
    pub max_snapshots_per_check: Option<usize>,

    /// Maximum in-flight archive requests
    #[arg(long, default_value_t = MAX_CONCURRENT_REQUESTS)]
    pub max_concurrency: usize,

    /// Base delay between executor tasks
    #[arg(long, default_value_t = REQUEST_DELAY_MS)]
    pub request_delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_MS / 1000)]
    pub timeout_seconds: u64,

    /// Maximum characters per report chunk
    #[arg(long, default_value_t = MAX_CHUNK_SIZE)]
    pub max_chunk_size: usize,

    /// Archive host (useful against a mirror or a local mock)
    #[arg(long, default_value = ARCHIVE_BASE_URL)]
    pub archive_base_url: String,
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        Self {
            archive_base_url: opt.archive_base_url,
            max_concurrent_requests: opt.max_concurrency.max(1),
            request_delay_ms: opt.request_delay_ms,
            request_timeout_ms: opt.timeout_seconds.saturating_mul(1000),
            max_chunk_size: opt.max_chunk_size.max(1),
            max_snapshots_per_check: opt.max_snapshots_per_check,
            include_titles: opt.include_titles,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.archive_base_url, "https://web.archive.org");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_backoff_ms, 2000);
        assert_eq!(config.max_backoff_ms, 30_000);
        assert_eq!(config.request_timeout_ms, 180_000);
        assert_eq!(config.max_concurrent_requests, 3);
        assert_eq!(config.request_delay_ms, 300);
        assert_eq!(config.max_chunk_size, 3800);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.max_snapshots_per_check, None);
        assert!(!config.include_titles);
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let config = Config {
            archive_base_url: "http://127.0.0.1:9000/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_opt_into_config() {
        let opt = Opt::parse_from([
            "wayback_redirects",
            "example.com",
            "--include-titles",
            "--max-snapshots-per-check",
            "50",
            "--timeout-seconds",
            "30",
            "--max-concurrency",
            "0",
        ]);
        assert_eq!(opt.domains, vec!["example.com".to_string()]);
        assert!(opt.serve.is_none());

        let config = Config::from(opt);
        assert!(config.include_titles);
        assert_eq!(config.max_snapshots_per_check, Some(50));
        assert_eq!(config.request_timeout_ms, 30_000);
        // Zero concurrency would stall the executor
        assert_eq!(config.max_concurrent_requests, 1);
        assert_eq!(config.max_retries, MAX_RETRIES);
    }

    #[test]
    fn test_opt_serve_mode() {
        let opt = Opt::parse_from(["wayback_redirects", "--serve", "8080"]);
        assert_eq!(opt.serve, Some(8080));
        assert!(opt.domains.is_empty());
    }
}
