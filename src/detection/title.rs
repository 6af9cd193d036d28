//! Page title extraction for the PAGE TITLES section.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{Html, Selector};

use crate::context::HistoryContext;
use crate::error_handling::{update_error_stats, ErrorType, FetchError, InfoType};
use crate::fetch::fetch_once;

const TITLE_SELECTOR_STR: &str = "title";

/// Placeholder for pages without a usable `<title>`.
pub const NO_TITLE: &str = "No Title";
/// Placeholder for pages that could not be fetched or were not 2xx.
pub const TITLE_NOT_FOUND: &str = "Not Found (page could not be accessed)";
/// Placeholder for pages that hit the request deadline.
pub const TITLE_TIMEOUT: &str = "Not Found (timeout - page took too long to respond)";

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(TITLE_SELECTOR_STR).expect("Failed to parse title selector - this is a bug")
});

/// Text of the first `<title>` element, trimmed. `None` when absent or blank.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title = document
        .select(&TITLE_SELECTOR)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    (!title.is_empty()).then_some(title)
}

/// Title of the capture at `url`, or one of the placeholders.
///
/// Found titles are cached under `page-title:<url>` for the title TTL;
/// placeholders for the regular TTL.
pub async fn page_title(ctx: &HistoryContext, url: &str) -> String {
    let cache_key = format!("page-title:{}", url);
    if let Some(cached) = ctx.cache.text.get(&cache_key) {
        ctx.stats.increment_info(InfoType::CacheHit);
        return cached;
    }

    let deadline = Duration::from_millis(ctx.config.request_timeout_ms);
    let (title, ttl) = match fetch_once(&ctx.client, url, deadline).await {
        Ok(response) if response.is_ok() => {
            ctx.health.record_success();
            match extract_title(&response.text()) {
                Some(title) => (title, ctx.config.title_cache_ttl_secs),
                None => (NO_TITLE.to_string(), ctx.config.cache_ttl_secs),
            }
        }
        Ok(response) => {
            log::debug!("Title fetch for {} returned {}", url, response.status);
            (TITLE_NOT_FOUND.to_string(), ctx.config.cache_ttl_secs)
        }
        Err(e) => {
            log::debug!("Error fetching title from {}: {}", url, e);
            ctx.health.record_error();
            update_error_stats(&ctx.stats, &e);
            ctx.stats.increment_error(ErrorType::TitleFetchError);
            let placeholder = match e {
                FetchError::Timeout => TITLE_TIMEOUT,
                _ => TITLE_NOT_FOUND,
            };
            (placeholder.to_string(), ctx.config.cache_ttl_secs)
        }
    };

    ctx.cache.text.set(cache_key, title.clone(), Some(ttl));
    title
}
