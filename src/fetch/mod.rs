//! Archive access.
//!
//! This module provides:
//! - Browser-like request headers with User-Agent rotation
//! - The resilient client (`fetch_with_retry`) and single-shot fetches
//! - Paginated CDX snapshot retrieval
//! - Redirect classification of 3xx captures

mod cdx;
mod client;
mod redirects;
mod request;
mod response;

pub use cdx::{
    archive_url, cdx_query_url, dedupe_snapshots, get_snapshots_paged, parse_cdx_rows,
    sort_newest_first, Snapshot, SnapshotWalk, FILTER_ANY, FILTER_OK, FILTER_REDIRECTS,
};
pub use client::{fetch_once, fetch_with_retry};
pub use redirects::{normalize_location, port_heuristic_target, resolve_redirect, RedirectInfo};
pub use response::{CachedBody, CachedResponse};
