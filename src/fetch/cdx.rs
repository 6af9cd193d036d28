//! CDX snapshot retrieval.
//!
//! The CDX search API answers with a JSON array of arrays whose first row is
//! the field header. Results are paged with `limit`/`offset`; the retriever
//! walks pages until the archive runs dry, a cap is hit, or a page fails.

use std::collections::HashSet;
use std::time::Duration;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use super::client::fetch_with_retry;
use super::response::CachedResponse;
use crate::config::{CDX_FIELDS, CDX_SEARCH_PATH};
use crate::context::HistoryContext;
use crate::error_handling::{ErrorType, FetchError, InfoType};

/// CDX filter selecting 3xx captures.
pub const FILTER_REDIRECTS: &str = "statuscode:3";
/// CDX filter selecting 200 captures.
pub const FILTER_OK: &str = "statuscode:200";
/// No filter: every capture regardless of status.
pub const FILTER_ANY: &str = "";

/// One capture of a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// `YYYYMMDDHHMMSS`
    pub timestamp: String,
    pub original_url: String,
    pub status_code: String,
    pub digest: String,
}

impl Snapshot {
    /// Decodes a `[timestamp, original, statuscode, digest]` row.
    ///
    /// Timestamp and original URL are required; missing trailing fields
    /// default to `-` (status) and empty (digest).
    pub fn from_row(row: &Value) -> Option<Self> {
        let fields = row.as_array()?;
        let field = |i: usize| fields.get(i).and_then(Value::as_str);
        Some(Self {
            timestamp: field(0)?.to_string(),
            original_url: field(1)?.to_string(),
            status_code: field(2).unwrap_or("-").to_string(),
            digest: field(3).unwrap_or_default().to_string(),
        })
    }
}

/// CDX query for one URL variant, without paging or filter parameters.
pub fn cdx_query_url(base_url: &str, target: &str) -> String {
    format!(
        "{}{}?url={}&output=json&fl={}",
        base_url, CDX_SEARCH_PATH, target, CDX_FIELDS
    )
}

/// URL of an archived capture.
pub fn archive_url(base_url: &str, timestamp: &str, original_url: &str) -> String {
    format!("{}/web/{}/{}", base_url, timestamp, original_url)
}

/// Decodes a CDX JSON document, skipping the header row and malformed rows.
pub fn parse_cdx_rows(data: &Value) -> Vec<Snapshot> {
    match data.as_array() {
        Some(rows) if rows.len() > 1 => rows[1..].iter().filter_map(Snapshot::from_row).collect(),
        _ => Vec::new(),
    }
}

fn rows_from_response(response: &CachedResponse) -> Result<Vec<Snapshot>, FetchError> {
    if response.text().trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(parse_cdx_rows(&response.json()?))
}

/// Removes repeated `(timestamp, original_url)` pairs, keeping the first seen.
pub fn dedupe_snapshots(snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
    let mut seen = HashSet::new();
    snapshots
        .into_iter()
        .filter(|s| seen.insert((s.timestamp.clone(), s.original_url.clone())))
        .collect()
}

/// Orders snapshots newest first. Timestamps compare as strings.
pub fn sort_newest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Rows gathered by one paged walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotWalk {
    pub snapshots: Vec<Snapshot>,
    /// `false` when a page error cut the walk short
    pub complete: bool,
}

/// Collects up to `max_snapshots` rows for `base_query_url`, page by page.
///
/// Never fails: a page error ends the walk and whatever was gathered so far is
/// returned with `complete: false`. Only complete walks are memoized under
/// `snapshots:<query>:<filter>:<max>`; each page response is memoized under
/// `page:<page url>` by the resilient client.
pub async fn get_snapshots_paged(
    ctx: &HistoryContext,
    base_query_url: &str,
    filter: &str,
    max_snapshots: usize,
) -> SnapshotWalk {
    let cache_key = format!("snapshots:{}:{}:{}", base_query_url, filter, max_snapshots);
    if let Some(cached) = ctx.cache.snapshots.get(&cache_key) {
        debug!("Cache hit for snapshots: {}", base_query_url);
        ctx.stats.increment_info(InfoType::CacheHit);
        return SnapshotWalk {
            snapshots: cached,
            complete: true,
        };
    }

    let page_size = ctx.config.cdx_page_size.max(1);
    let ttl = Some(ctx.config.cache_ttl_secs);
    let mut collected: Vec<Snapshot> = Vec::new();
    let mut offset = 0;
    let mut complete = true;

    debug!("Getting snapshots with pagination from {}", base_query_url);
    while collected.len() < max_snapshots {
        if ctx.health.pause_if_unhealthy().await {
            ctx.stats.increment_info(InfoType::HealthPause);
        }

        let mut url = format!("{}&limit={}&offset={}", base_query_url, page_size, offset);
        if !filter.is_empty() {
            url.push_str("&filter=");
            url.push_str(filter);
        }
        let page_key = format!("page:{}", url);

        debug!("Fetching page: offset={}, limit={}", offset, page_size);
        let page = match fetch_with_retry(ctx, &url, &[200], Some(&page_key), ttl)
            .await
            .and_then(|response| rows_from_response(&response))
        {
            Ok(rows) => rows,
            Err(e) => {
                debug!("Error in pagination at offset {}: {}", offset, e);
                ctx.stats.increment_error(ErrorType::CdxPageError);
                complete = false;
                if !ctx.health.is_healthy() {
                    debug!("Adding extra delay due to network issues...");
                    tokio::time::sleep(Duration::from_millis(ctx.config.page_error_delay_ms))
                        .await;
                }
                break;
            }
        };

        if page.is_empty() {
            debug!("No more snapshots found at offset {}", offset);
            break;
        }
        let page_len = page.len();
        debug!("Found {} snapshots in this page", page_len);
        collected.extend(page);

        if page_len < page_size {
            debug!("End of snapshots reached (got {} < {})", page_len, page_size);
            break;
        }
        if collected.len() >= max_snapshots {
            debug!("Reached maximum snapshots limit ({})", max_snapshots);
            break;
        }
        offset += page_size;
        tokio::time::sleep(Duration::from_millis(ctx.config.page_fetch_delay_ms)).await;
    }

    collected.truncate(max_snapshots);
    debug!("Total snapshots collected: {}", collected.len());
    if complete {
        ctx.cache.snapshots.set(cache_key, collected.clone(), ttl);
    }
    SnapshotWalk {
        snapshots: collected,
        complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(ts: &str, url: &str, digest: &str) -> Snapshot {
        Snapshot {
            timestamp: ts.into(),
            original_url: url.into(),
            status_code: "301".into(),
            digest: digest.into(),
        }
    }

    #[test]
    fn test_parse_cdx_rows_skips_header() {
        let data = json!([
            ["timestamp", "original", "statuscode", "digest"],
            ["20240326053735", "http://example.com/", "301", "ABC"],
            ["20230101000000", "http://www.example.com/"],
            ["broken"],
        ]);
        let rows = parse_cdx_rows(&data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status_code, "301");
        assert_eq!(rows[1].status_code, "-");
        assert_eq!(rows[1].digest, "");
    }

    #[test]
    fn test_parse_cdx_rows_header_only_or_empty() {
        assert!(parse_cdx_rows(&json!([["timestamp", "original"]])).is_empty());
        assert!(parse_cdx_rows(&json!([])).is_empty());
        assert!(parse_cdx_rows(&json!({"error": "x"})).is_empty());
    }

    #[test]
    fn test_dedupe_keeps_first_seen() {
        let deduped = dedupe_snapshots(vec![
            snapshot("20240101000000", "http://example.com/", "A"),
            snapshot("20240101000000", "http://example.com/", "B"),
            snapshot("20240101000000", "https://example.com/", "C"),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].digest, "A");
    }

    #[test]
    fn test_sort_newest_first() {
        let mut list = vec![
            snapshot("20200101000000", "a", ""),
            snapshot("20240101000000", "b", ""),
            snapshot("20220101000000", "c", ""),
        ];
        sort_newest_first(&mut list);
        let order: Vec<&str> = list.iter().map(|s| s.original_url.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_query_urls() {
        assert_eq!(
            cdx_query_url("https://web.archive.org", "http://example.com/"),
            "https://web.archive.org/cdx/search/cdx?url=http://example.com/&output=json&fl=timestamp,original,statuscode,digest"
        );
        assert_eq!(
            archive_url("https://web.archive.org", "20240101000000", "http://example.com/"),
            "https://web.archive.org/web/20240101000000/http://example.com/"
        );
    }

    fn walk_ctx(server: &httptest::Server) -> HistoryContext {
        HistoryContext::new(crate::config::Config {
            archive_base_url: server.url_str(""),
            max_retries: 1,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
            request_jitter_max_ms: 0,
            request_delay_ms: 0,
            page_fetch_delay_ms: 0,
            page_error_delay_ms: 0,
            health_pause_secs: 0,
            cdx_page_size: 2,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_walk_follows_pages_and_caches_complete_result() {
        use httptest::{matchers::*, responders::*, Expectation, Server};

        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/cdx/search/cdx"),
                request::query(url_decoded(contains(("offset", "0")))),
            ])
            .respond_with(json_encoded(json!([
                ["timestamp", "original", "statuscode", "digest"],
                ["20240101000000", "http://example.com/", "301", "A"],
                ["20230101000000", "http://example.com/", "301", "B"],
            ]))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/cdx/search/cdx"),
                request::query(url_decoded(contains(("offset", "2")))),
            ])
            .respond_with(json_encoded(json!([
                ["timestamp", "original", "statuscode", "digest"],
                ["20220101000000", "http://example.com/", "302", "C"],
            ]))),
        );

        let ctx = walk_ctx(&server);
        let query = cdx_query_url(ctx.config.base_url(), "example.com");
        let walk = get_snapshots_paged(&ctx, &query, FILTER_REDIRECTS, usize::MAX).await;
        assert!(walk.complete);
        assert_eq!(walk.snapshots.len(), 3);

        // Served from the aggregate cache, no further requests
        let again = get_snapshots_paged(&ctx, &query, FILTER_REDIRECTS, usize::MAX).await;
        assert_eq!(again, walk);
    }

    #[tokio::test]
    async fn test_walk_cut_short_is_incomplete_and_not_cached() {
        use httptest::{matchers::*, responders::*, Expectation, Server};

        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/cdx/search/cdx"))
                .times(2)
                .respond_with(status_code(503)),
        );

        let ctx = walk_ctx(&server);
        let query = cdx_query_url(ctx.config.base_url(), "example.com");
        for _ in 0..2 {
            let walk = get_snapshots_paged(&ctx, &query, FILTER_OK, usize::MAX).await;
            assert!(!walk.complete);
            assert!(walk.snapshots.is_empty());
        }
        assert_eq!(ctx.stats.get_error_count(ErrorType::CdxPageError), 2);
    }
}
