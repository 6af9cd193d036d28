// Shared test helpers for archive mocks and fast configurations.
//
// Every integration test points a `HistoryContext` at an `httptest` server
// standing in for the archive, with all pacing delays shrunk to zero.

use httptest::Server;
use serde_json::{json, Value};

use wayback_redirects::{Config, HistoryContext};

/// Path of the CDX search endpoint on the mock archive.
#[allow(dead_code)] // Used by other test files
pub const CDX_PATH: &str = "/cdx/search/cdx";

/// Configuration with single attempts and no pacing delays.
#[allow(dead_code)] // Used by other test files
pub fn fast_config(server: &Server) -> Config {
    Config {
        archive_base_url: server.url_str(""),
        max_retries: 1,
        initial_backoff_ms: 1,
        max_backoff_ms: 1,
        request_timeout_ms: 5_000,
        client_side_timeout_ms: 5_000,
        request_jitter_max_ms: 0,
        request_delay_ms: 0,
        page_fetch_delay_ms: 0,
        page_error_delay_ms: 0,
        health_pause_secs: 0,
        ..Default::default()
    }
}

/// Context over [`fast_config`], optionally tweaked by the caller.
#[allow(dead_code)] // Used by other test files
pub fn context_with(server: &Server, tweak: impl FnOnce(&mut Config)) -> HistoryContext {
    let mut config = fast_config(server);
    tweak(&mut config);
    HistoryContext::new(config).expect("Failed to build test context")
}

/// CDX JSON document with the field header and `(timestamp, original, status)` rows.
#[allow(dead_code)] // Used by other test files
pub fn cdx_rows(rows: &[(&str, &str, &str)]) -> Value {
    let mut document = vec![json!(["timestamp", "original", "statuscode", "digest"])];
    document.extend(
        rows.iter()
            .map(|(ts, original, status)| json!([ts, original, status, format!("DIGEST{}", ts)])),
    );
    Value::Array(document)
}

/// A CDX document carrying only the header row.
#[allow(dead_code)] // Used by other test files
pub fn empty_cdx() -> Value {
    cdx_rows(&[])
}

#[allow(dead_code)] // Used by other test files
pub const EMPTY_REPORT: &str = "3XX HTTP REDIRECTS\n=========\nNo 3XX HTTP redirects found\n\nCLIENT-SIDE REDIRECTS\n=========\nNo client-side redirects found\n";
