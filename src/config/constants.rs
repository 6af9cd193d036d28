//! Configuration constants.
//!
//! This module defines all tunables used throughout the redirect discovery engine,
//! including retry/backoff parameters, concurrency limits, cache lifetimes and the
//! denylists used for noise filtering.

/// Wayback Machine host. CDX queries and snapshot fetches are built on top of it.
pub const ARCHIVE_BASE_URL: &str = "https://web.archive.org";

/// Path of the CDX search endpoint, relative to [`ARCHIVE_BASE_URL`].
pub const CDX_SEARCH_PATH: &str = "/cdx/search/cdx";

/// Fields requested from the CDX API, in the order rows are decoded.
pub const CDX_FIELDS: &str = "timestamp,original,statuscode,digest";

// Retry strategy
/// Maximum number of attempts for a single archive request (initial attempt included)
pub const MAX_RETRIES: usize = 5;
/// Seed for the jittered exponential backoff, in milliseconds
pub const INITIAL_BACKOFF_MS: u64 = 2000;
/// Upper bound for any single backoff sleep, in milliseconds
pub const MAX_BACKOFF_MS: u64 = 30_000;
/// Multiplier applied to the backoff after every failed attempt
pub const BACKOFF_FACTOR: f64 = 1.5;
/// Maximum extra jitter fraction applied on top of [`BACKOFF_FACTOR`] (0.2 = +20%)
pub const BACKOFF_JITTER: f64 = 0.2;

// Request timing
/// Deadline for a single archive request (3 minutes; the archive can be very slow)
pub const REQUEST_TIMEOUT_MS: u64 = 180_000;
/// Deadline for fetching a 200 snapshot body during client-side redirect checks
pub const CLIENT_SIDE_TIMEOUT_MS: u64 = 60_000;
/// Upper bound of the random delay inserted before every request attempt
pub const REQUEST_JITTER_MAX_MS: u64 = 500;

// Parallelism
/// Maximum in-flight archive requests per executor batch
pub const MAX_CONCURRENT_REQUESTS: usize = 3;
/// Base delay between starting two executor items
pub const REQUEST_DELAY_MS: u64 = 300;
/// Consecutive item failures before the executor halves its concurrency
pub const ADAPTIVE_FAILURE_THRESHOLD: usize = 3;
/// Per-failure step of the extra delay after a failed item
pub const FAILURE_DELAY_STEP_MS: u64 = 1000;
/// Cap of the extra delay after a failed item
pub const FAILURE_DELAY_CAP_MS: u64 = 10_000;

// Snapshot retrieval
/// Maximum snapshots collected per CDX query variant (unbounded by default)
pub const MAX_SNAPSHOTS_TO_CHECK: usize = usize::MAX;
/// Rows requested per CDX page
pub const CDX_PAGE_SIZE: usize = 1000;
/// Pause between two consecutive CDX pages
pub const PAGE_FETCH_DELAY_MS: u64 = 1000;
/// Pause after a failed CDX page while the network is unhealthy
pub const PAGE_ERROR_DELAY_MS: u64 = 10_000;

// Network health
/// Consecutive failures after which the network is considered unhealthy
pub const HEALTH_FAILURE_THRESHOLD: u32 = 5;
/// Minimum interval between two degradation warnings
pub const HEALTH_WARNING_COOLDOWN_SECS: u64 = 60;
/// Pause applied by consumers when the network is unhealthy
pub const HEALTH_PAUSE_SECS: u64 = 30;

// Report
/// Maximum characters per report chunk (kept below Telegram's 4096 limit)
pub const MAX_CHUNK_SIZE: usize = 3800;

// Cache lifetimes
/// Default TTL for cached archive data
pub const CACHE_DEFAULT_TTL_SECONDS: u64 = 3600;
/// TTL for negative or unknown results
pub const NEGATIVE_CACHE_TTL_SECONDS: u64 = 1800;
/// TTL for successfully extracted page titles
pub const TITLE_CACHE_TTL_SECONDS: u64 = 86_400;

/// Redirect targets that are known noise (false positives from embedded markup).
pub const IGNORED_DOMAINS: &[&str] = &[
    "w3.org",
    "google.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
];

/// Host tokens of third-party services commonly referenced from page scripts.
pub const COMMON_SERVICE_DOMAINS: &[&str] = &[
    "google",
    "facebook",
    "twitter",
    "instagram",
    "youtube",
    "linkedin",
    "github",
    "amazonaws",
    "cloudfront",
    "cdn",
    "analytics",
    "tracking",
    "stats",
    "ads",
    "doubleclick",
    "google-analytics",
    "googletagmanager",
    "hotjar",
    "jquery",
    "cloudflare",
    "googleapis",
    "gstatic",
];
