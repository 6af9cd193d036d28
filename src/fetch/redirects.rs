//! Redirect classification for 3xx captures.
//!
//! The archive replays a captured redirect as its own 3xx response whose
//! `Location` points back into the archive (`/web/<ts>/<url>`). Resolving a
//! capture means fetching it with redirects disabled and unwrapping that
//! header, with content and port heuristics as fallbacks.

use std::sync::LazyLock;
use std::time::Duration;

use log::debug;
use regex::Regex;
use serde::Serialize;

use super::cdx::archive_url;
use super::client::fetch_once;
use super::response::CachedResponse;
use crate::context::HistoryContext;
use crate::detection::{detect_client_side_redirect, fallback_body_target, ClientRedirectDetail};
use crate::domain::{explicit_port, extract_domain, extract_host, normalize_target};
use crate::error_handling::{update_error_stats, ErrorType, InfoType};

const ARCHIVE_HOST_MARKER: &str = "web.archive.org/web/";
const ABSOLUTE_ARCHIVE_PATTERN: &str = r"(?i)web\.archive\.org/web/\d+(?:id_)?/(?:https?://)?(.+)";
const RELATIVE_ARCHIVE_PATTERN: &str = r"(?i)/web/\d+(?:id_)?/(?:https?://)?(.+)";

static ABSOLUTE_ARCHIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(ABSOLUTE_ARCHIVE_PATTERN).expect("Failed to compile archive regex - this is a bug")
});
static RELATIVE_ARCHIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(RELATIVE_ARCHIVE_PATTERN).expect("Failed to compile archive regex - this is a bug")
});

/// Where a capture redirects to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectInfo {
    pub target_url: String,
    /// Status of the archived response, e.g. `"301"`
    pub status_code: String,
    /// Whether the target came from page content rather than a header
    pub client_side: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ClientRedirectDetail>,
}

/// Turns a `Location` header from the archive into the original target URL.
///
/// Archive-wrapped locations (absolute on `web.archive.org` or on
/// `archive_base`, or relative `/web/...`) are unwrapped to `http://<url>`;
/// other root-relative paths resolve against the original domain.
pub fn normalize_location(location: &str, original_url: &str, archive_base: &str) -> String {
    let unwrap = |re: &Regex, haystack: &str| {
        re.captures(haystack)
            .and_then(|caps| caps.get(1))
            .map(|m| format!("http://{}", m.as_str()))
    };

    let local = location
        .strip_prefix(archive_base)
        .filter(|rest| rest.starts_with("/web/"));

    let target = if location.contains(ARCHIVE_HOST_MARKER) {
        unwrap(&ABSOLUTE_ARCHIVE_RE, location).unwrap_or_else(|| location.to_string())
    } else if let Some(rest) = local {
        unwrap(&RELATIVE_ARCHIVE_RE, rest).unwrap_or_else(|| location.to_string())
    } else if location.starts_with("/web/") {
        unwrap(&RELATIVE_ARCHIVE_RE, location).unwrap_or_else(|| location.to_string())
    } else if location.starts_with('/') {
        format!("http://{}{}", extract_domain(original_url), location)
    } else {
        location.to_string()
    };

    if target.starts_with("http") {
        target
    } else {
        format!("http://{}", target)
    }
}

/// Target guessed from an explicit port in the original URL.
///
/// `:80` toggles `www.`, `:443` upgrades the bare domain to `https://`, and
/// any other port is dropped in favour of bare `http://`.
pub fn port_heuristic_target(original_url: &str) -> Option<String> {
    let port = explicit_port(original_url)?;
    let domain = extract_domain(original_url);
    let target = match port {
        80 => {
            let host = extract_host(original_url).unwrap_or_else(|| domain.clone());
            match host.strip_prefix("www.") {
                Some(bare) => format!("http://{}", bare),
                None => format!("http://www.{}", host),
            }
        }
        443 => format!("https://{}", domain),
        _ => format!("http://{}", domain),
    };
    Some(target)
}

/// Resolves where the capture of `original_url` at `timestamp` redirects to.
///
/// Returns `None` when no target can be determined or the fetch fails. Every
/// outcome is cached under `redirect-target:<ts>:<url>`: positives for the
/// regular TTL, negatives and failures for the negative TTL.
pub async fn resolve_redirect(
    ctx: &HistoryContext,
    timestamp: &str,
    original_url: &str,
) -> Option<RedirectInfo> {
    let cache_key = format!("redirect-target:{}:{}", timestamp, original_url);
    if let Some(cached) = ctx.cache.redirects.get(&cache_key) {
        ctx.stats.increment_info(InfoType::CacheHit);
        return cached;
    }

    let base = ctx.config.base_url();
    let url = archive_url(base, timestamp, original_url);
    debug!("Checking redirect header from: {}", url);

    let deadline = Duration::from_millis(ctx.config.request_timeout_ms);
    let result = match fetch_once(&ctx.redirect_client, &url, deadline).await {
        Ok(response) => {
            ctx.health.record_success();
            classify_response(ctx, &response, original_url, base)
        }
        Err(e) => {
            debug!("Error checking header for {}: {}", url, e);
            ctx.health.record_error();
            update_error_stats(&ctx.stats, &e);
            ctx.stats.increment_error(ErrorType::RedirectResolveError);
            None
        }
    };

    let ttl = if result.is_some() {
        ctx.config.cache_ttl_secs
    } else {
        ctx.config.negative_cache_ttl_secs
    };
    ctx.cache.redirects.set(cache_key, result.clone(), Some(ttl));
    result
}

fn classify_response(
    ctx: &HistoryContext,
    response: &CachedResponse,
    original_url: &str,
    archive_base: &str,
) -> Option<RedirectInfo> {
    let status_code = response.status.to_string();

    if !response.is_redirect() {
        debug!("Not a 3XX redirect: status code {}", status_code);
        if !response.is_ok() {
            return None;
        }
        return detect_client_side_redirect(ctx, &response.text(), original_url).map(|detail| {
            RedirectInfo {
                target_url: detail.target_url.clone(),
                status_code,
                client_side: true,
                detail: Some(detail),
            }
        });
    }

    if let Some(location) = response.location() {
        let target_url = normalize_location(location, original_url, archive_base);
        debug!("Found Location header: {} -> {}", location, target_url);
        ctx.stats.increment_info(InfoType::HttpRedirect);
        return Some(RedirectInfo {
            target_url,
            status_code,
            client_side: false,
            detail: None,
        });
    }

    // 3xx without Location: look at the body, then at the port
    let body = response.text();
    if let Some(detail) = detect_client_side_redirect(ctx, &body, original_url) {
        return Some(RedirectInfo {
            target_url: detail.target_url.clone(),
            status_code,
            client_side: true,
            detail: Some(detail),
        });
    }
    if let Some(raw) = fallback_body_target(&body) {
        let target_url = normalize_target(raw, original_url);
        debug!("Found redirect in 3XX body: {}", target_url);
        return Some(RedirectInfo {
            target_url,
            status_code,
            client_side: true,
            detail: None,
        });
    }

    port_heuristic_target(original_url).map(|target_url| {
        debug!("Assuming port-based redirect for {}: {}", original_url, target_url);
        ctx.stats.increment_info(InfoType::PortHeuristic);
        RedirectInfo {
            target_url,
            status_code,
            client_side: false,
            detail: None,
        }
    })
}
