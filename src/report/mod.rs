//! Domain history report assembly.
//!
//! `check_domain_history` drives the whole pipeline for one domain: CDX
//! retrieval across URL variants, redirect classification, client-side
//! detection and (optionally) page titles. The sections are cached per
//! domain and the final text is split into message-sized chunks.

mod chunk;
mod format;
mod variants;

use std::convert::Infallible;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{debug, info};
use serde::Serialize;

pub use chunk::{split_into_chunks, with_part_headers};
pub use format::{
    format_client_side_entry, format_redirect_entry, format_title_entry,
    format_wayback_timestamp, render_client_side_section, CLIENT_SIDE_HEADER, NO_CLIENT_SIDE,
    NO_PAGES, NO_REDIRECTS, REDIRECTS_HEADER, TITLES_HEADER,
};
pub use variants::{ok_variants, page_variants, redirect_variants};

use crate::context::HistoryContext;
use crate::detection::{detect_client_side_redirect, page_title, ClientRedirectDetail};
use crate::domain::normalize_domain_input;
use crate::error_handling::{update_error_stats, ErrorType, FetchError, InfoType};
use crate::executor::{run_bounded, ExecutorOptions};
use crate::fetch::{
    archive_url, cdx_query_url, dedupe_snapshots, fetch_once, get_snapshots_paged,
    resolve_redirect, sort_newest_first, Snapshot, FILTER_ANY, FILTER_OK, FILTER_REDIRECTS,
};
use crate::utils::ExecutionTime;
use crate::utils::ExecutionTimer;

/// A 200 capture whose content redirects elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSideHit {
    pub snapshot: Snapshot,
    pub detail: ClientRedirectDetail,
}

/// Result of one domain check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    /// One entry per chunk (or a single `Error: ...` line)
    pub logs: Vec<String>,
    /// Chunks ready to be sent as individual messages
    pub message_chunks: Vec<String>,
    pub execution_time: ExecutionTime,
}

impl HistoryReport {
    /// Whether assembly collapsed into a single `Error:` line.
    pub fn is_error(&self) -> bool {
        matches!(self.message_chunks.as_slice(), [only] if only.starts_with("Error: "))
    }
}

/// Builds the redirect history report for `domain`.
///
/// Never fails: an assembly error replaces the report with a single
/// `Error: <message>` entry. Resets the context's health monitor and
/// counters first; the cache is reused across checks.
pub async fn check_domain_history(ctx: &HistoryContext, domain: &str) -> HistoryReport {
    ctx.reset();
    let timer = ExecutionTimer::start();
    info!("Starting domain history check for: {}", domain);

    let chunks = match assemble_report(ctx, domain).await {
        Ok(text) => with_part_headers(split_into_chunks(&text, ctx.config.max_chunk_size)),
        Err(e) => {
            debug!("Error checking domain history: {:#}", e);
            vec![format!("Error: {}", e)]
        }
    };
    let execution_time = timer.stop();

    debug!(
        "Total execution time: {} seconds ({})",
        execution_time.seconds, execution_time.formatted
    );
    let cache_stats = ctx.cache.stats();
    debug!(
        "Cache statistics: {}",
        serde_json::to_string(&cache_stats).unwrap_or_else(|_| cache_stats.size.to_string())
    );
    debug!("{}", ctx.health.status_line());
    ctx.stats.log_summary();

    HistoryReport {
        logs: chunks.clone(),
        message_chunks: chunks,
        execution_time,
    }
}

/// Cache keys of the final sections for one domain.
struct SectionKeys {
    redirects: String,
    client_side: String,
    titles: String,
}

impl SectionKeys {
    fn new(domain: &str) -> Self {
        Self {
            redirects: format!("final-redirects:{}", domain),
            client_side: format!("final-client-redirects:{}", domain),
            titles: format!("final-titles:{}", domain),
        }
    }
}

async fn assemble_report(ctx: &HistoryContext, domain: &str) -> Result<String> {
    let domain = normalize_domain_input(domain)
        .ok_or_else(|| anyhow!("Invalid domain: {:?}", domain.trim()))?;
    let keys = SectionKeys::new(&domain);
    let include_titles = ctx.config.include_titles;
    let ttl = Some(ctx.config.cache_ttl_secs);

    if let Some(text) = cached_report(ctx, &keys, include_titles) {
        info!("Found complete cached results for {}", domain);
        ctx.stats.increment_info(InfoType::CacheHit);
        return Ok(text);
    }

    let options = ExecutorOptions::from_config(&ctx.config);

    let ((snapshots_3xx, complete_3xx), (snapshots_200, complete_200)) = tokio::join!(
        collect_variant_snapshots(
            ctx,
            format!("3xx-snapshots:{}", domain),
            redirect_variants(&domain),
            FILTER_REDIRECTS,
            &options,
        ),
        collect_variant_snapshots(
            ctx,
            format!("200-snapshots:{}", domain),
            ok_variants(&domain),
            FILTER_OK,
            &options,
        ),
    );
    let (hits, complete_hits) =
        check_client_side_redirects(ctx, &domain, snapshots_200, complete_200, &options).await;
    let page_snapshots = if include_titles {
        Some(
            collect_variant_snapshots(
                ctx,
                format!("page-snapshots:{}", domain),
                page_variants(&domain),
                FILTER_ANY,
                &options,
            )
            .await,
        )
    } else {
        None
    };

    // Sections built from a walk cut short by archive errors are served but
    // not cached, so the next check queries the archive again.
    let redirects_text = render_redirects_section(ctx, snapshots_3xx, &options).await;
    if complete_3xx {
        ctx.cache.text.set(keys.redirects, redirects_text.clone(), ttl);
    }

    let client_side_text = render_client_side_section(&hits);
    if complete_hits {
        ctx.cache.text.set(keys.client_side, client_side_text.clone(), ttl);
    }

    let mut sections = vec![redirects_text, client_side_text];
    if let Some((pages, complete_pages)) = page_snapshots {
        let titles_text = render_titles_section(ctx, pages, &options).await;
        if complete_pages {
            ctx.cache.text.set(keys.titles, titles_text.clone(), ttl);
        }
        sections.push(titles_text);
    }
    if !(complete_3xx && complete_hits) {
        info!("Archive errors during check of {}; sections not cached", domain);
    }
    Ok(sections.join("\n"))
}

/// Joined sections when every one the configuration needs is cached.
fn cached_report(ctx: &HistoryContext, keys: &SectionKeys, include_titles: bool) -> Option<String> {
    let mut sections = vec![
        ctx.cache.text.get(&keys.redirects)?,
        ctx.cache.text.get(&keys.client_side)?,
    ];
    if include_titles {
        sections.push(ctx.cache.text.get(&keys.titles)?);
    }
    Some(sections.join("\n"))
}

/// Queries every variant (bounded parallel) and merges the deduplicated rows.
///
/// The flag is `false` when any variant walk was cut short; the merged set is
/// only cached under `cache_key` when every walk completed.
async fn collect_variant_snapshots(
    ctx: &HistoryContext,
    cache_key: String,
    variants: Vec<String>,
    filter: &str,
    options: &ExecutorOptions,
) -> (Vec<Snapshot>, bool) {
    if let Some(cached) = ctx.cache.snapshots.get(&cache_key) {
        debug!("Cache hit for {}", cache_key);
        ctx.stats.increment_info(InfoType::CacheHit);
        return (cached, true);
    }

    let base = ctx.config.base_url();
    let max = ctx.config.max_snapshots_to_check;
    let walks = run_bounded(
        variants,
        move |variant| async move {
            let query = cdx_query_url(base, &variant);
            Ok::<_, Infallible>(get_snapshots_paged(ctx, &query, filter, max).await)
        },
        options,
        &ctx.health,
    )
    .await;

    let complete = walks.iter().all(|walk| walk.as_ref().is_some_and(|w| w.complete));
    let snapshots = dedupe_snapshots(
        walks
            .into_iter()
            .flatten()
            .flat_map(|walk| walk.snapshots)
            .collect(),
    );
    debug!(
        "{}: {} unique snapshots (complete: {})",
        cache_key,
        snapshots.len(),
        complete
    );
    if complete {
        ctx.cache
            .snapshots
            .set(cache_key, snapshots.clone(), Some(ctx.config.cache_ttl_secs));
    }
    (snapshots, complete)
}

/// Newest first, capped to `max_snapshots_per_check` when configured.
fn newest_capped(mut snapshots: Vec<Snapshot>, cap: Option<usize>) -> Vec<Snapshot> {
    sort_newest_first(&mut snapshots);
    if let Some(cap) = cap {
        snapshots.truncate(cap);
    }
    snapshots
}

async fn render_redirects_section(
    ctx: &HistoryContext,
    mut snapshots: Vec<Snapshot>,
    options: &ExecutorOptions,
) -> String {
    let mut text = REDIRECTS_HEADER.to_string();
    if snapshots.is_empty() {
        text.push_str(NO_REDIRECTS);
        return text;
    }

    sort_newest_first(&mut snapshots);
    let entries = run_bounded(
        snapshots,
        move |snapshot| async move { Ok::<_, Infallible>(redirect_entry(ctx, &snapshot).await) },
        options,
        &ctx.health,
    )
    .await;
    let entries: Vec<String> = entries.into_iter().flatten().collect();
    text.push_str(&entries.join("\n"));
    text
}

async fn redirect_entry(ctx: &HistoryContext, snapshot: &Snapshot) -> String {
    let cache_key = format!(
        "formatted-redirect:{}:{}",
        snapshot.timestamp, snapshot.original_url
    );
    if let Some(cached) = ctx.cache.text.get(&cache_key) {
        ctx.stats.increment_info(InfoType::CacheHit);
        return cached;
    }

    let info = resolve_redirect(ctx, &snapshot.timestamp, &snapshot.original_url).await;
    let entry = format_redirect_entry(snapshot, info.as_ref().map(|i| i.target_url.as_str()));
    ctx.cache
        .text
        .set(cache_key, entry.clone(), Some(ctx.config.cache_ttl_secs));
    entry
}

/// Fetches 200 captures and keeps those whose content redirects.
///
/// The flag is `false` when `snapshots` came from an incomplete walk or any
/// capture could not be fetched; the hits are then not cached.
async fn check_client_side_redirects(
    ctx: &HistoryContext,
    domain: &str,
    snapshots: Vec<Snapshot>,
    snapshots_complete: bool,
    options: &ExecutorOptions,
) -> (Vec<ClientSideHit>, bool) {
    let snapshots = newest_capped(snapshots, ctx.config.max_snapshots_per_check);
    let cache_key = format!("client-side-redirects:{}:{}", domain, snapshots.len());
    if snapshots_complete {
        if let Some(cached) = ctx.cache.client_side_hits.get(&cache_key) {
            debug!("Cache hit for client-side redirects for {}", domain);
            ctx.stats.increment_info(InfoType::CacheHit);
            return (cached, true);
        }
    }

    debug!(
        "Checking for client-side redirects in {} snapshots...",
        snapshots.len()
    );
    let results = run_bounded(
        snapshots,
        move |snapshot| async move {
            let checked = check_snapshot_content(ctx, &snapshot).await;
            Ok::<_, Infallible>(
                checked.map(|detail| detail.map(|detail| ClientSideHit { snapshot, detail })),
            )
        },
        options,
        &ctx.health,
    )
    .await;

    let fetched_all = results.iter().all(|r| matches!(r, Some(Ok(_))));
    let hits: Vec<ClientSideHit> = results
        .into_iter()
        .flatten()
        .filter_map(|checked| checked.ok().flatten())
        .collect();
    debug!("Found {} client-side redirects for {}", hits.len(), domain);

    let complete = snapshots_complete && fetched_all;
    if complete {
        ctx.cache
            .client_side_hits
            .set(cache_key, hits.clone(), Some(ctx.config.cache_ttl_secs));
    }
    (hits, complete)
}

/// Client-side redirect in one 200 capture, if any.
///
/// Outcomes are cached under `client-redirect-check:<ts>:<url>`; fetch
/// failures are returned as errors and not cached, so a later check can
/// retry them. A non-2xx answer still counts as the archive responding.
async fn check_snapshot_content(
    ctx: &HistoryContext,
    snapshot: &Snapshot,
) -> Result<Option<ClientRedirectDetail>, FetchError> {
    let cache_key = format!(
        "client-redirect-check:{}:{}",
        snapshot.timestamp, snapshot.original_url
    );
    if let Some(cached) = ctx.cache.client_side.get(&cache_key) {
        ctx.stats.increment_info(InfoType::CacheHit);
        return Ok(cached);
    }

    let url = archive_url(ctx.config.base_url(), &snapshot.timestamp, &snapshot.original_url);
    let deadline = Duration::from_millis(ctx.config.client_side_timeout_ms);
    let response = fetch_once(&ctx.client, &url, deadline).await.map_err(|e| {
        debug!("Error checking client-side redirect for {}: {}", url, e);
        ctx.health.record_error();
        update_error_stats(&ctx.stats, &e);
        ctx.stats.increment_error(ErrorType::SnapshotFetchError);
        e
    })?;
    ctx.health.record_success();

    let detail = if response.is_ok() {
        detect_client_side_redirect(ctx, &response.text(), &snapshot.original_url)
    } else {
        debug!("Snapshot {} returned {}", url, response.status);
        None
    };

    let ttl = if detail.is_some() {
        ctx.config.cache_ttl_secs
    } else {
        ctx.config.negative_cache_ttl_secs
    };
    ctx.cache.client_side.set(cache_key, detail.clone(), Some(ttl));
    Ok(detail)
}

async fn render_titles_section(
    ctx: &HistoryContext,
    snapshots: Vec<Snapshot>,
    options: &ExecutorOptions,
) -> String {
    let mut text = TITLES_HEADER.to_string();
    let snapshots = newest_capped(snapshots, ctx.config.max_snapshots_per_check);
    if snapshots.is_empty() {
        text.push_str(NO_PAGES);
        return text;
    }

    let entries = run_bounded(
        snapshots,
        move |snapshot| async move { Ok::<_, Infallible>(title_entry(ctx, &snapshot).await) },
        options,
        &ctx.health,
    )
    .await;
    text.extend(entries.into_iter().flatten());
    text
}

async fn title_entry(ctx: &HistoryContext, snapshot: &Snapshot) -> String {
    let cache_key = format!(
        "formatted-title:{}:{}",
        snapshot.timestamp, snapshot.original_url
    );
    if let Some(cached) = ctx.cache.text.get(&cache_key) {
        ctx.stats.increment_info(InfoType::CacheHit);
        return cached;
    }

    let url = archive_url(ctx.config.base_url(), &snapshot.timestamp, &snapshot.original_url);
    let title = page_title(ctx, &url).await;
    let entry = format_title_entry(&snapshot.timestamp, &title);
    ctx.cache
        .text
        .set(cache_key, entry.clone(), Some(ctx.config.cache_ttl_secs));
    entry
}
