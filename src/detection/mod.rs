//! Client-side redirect detection.
//!
//! Archived pages often redirect from their content instead of an HTTP
//! status: a meta refresh, a `location` assignment, or a timed script. This
//! module recognises those signals and extracts page titles.
//!
//! Key functions:
//! - `detect()` - Runs the strategy list over an HTML body
//! - `detect_client_side_redirect()` - Cached detection, first match wins
//! - `page_title()` - Title of an archived page, with placeholders

mod filter;
mod patterns;
mod title;

use serde::Serialize;
use sha2::{Digest, Sha256};

pub use filter::{is_common_service_domain, is_ignored_domain, is_noise};
pub use patterns::{
    detect_with, fallback_body_target, JsLocationStrategy, JsTimeoutStrategy,
    MetaRefreshStrategy, RedirectStrategy, DEFAULT_STRATEGIES,
};
pub use title::{extract_title, page_title, NO_TITLE, TITLE_NOT_FOUND, TITLE_TIMEOUT};

use crate::context::HistoryContext;
use crate::error_handling::InfoType;

/// Family of a client-side redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectKind {
    MetaRefresh,
    JsRedirect,
    JsTimeoutRedirect,
}

impl RedirectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectKind::MetaRefresh => "meta-refresh",
            RedirectKind::JsRedirect => "js-redirect",
            RedirectKind::JsTimeoutRedirect => "js-timeout-redirect",
        }
    }
}

impl std::fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A redirect found in page content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRedirectDetail {
    pub kind: RedirectKind,
    /// Absolute target URL
    pub target_url: String,
    /// Delay before the redirect fires, when the page states one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<f64>,
    pub message: String,
}

/// Runs the default strategies over `html` without caching.
pub fn detect(html: &str, original_url: &str) -> Option<ClientRedirectDetail> {
    detect_with(DEFAULT_STRATEGIES, html, original_url)
}

fn content_fingerprint(html: &str) -> String {
    hex::encode(Sha256::digest(html.as_bytes()))
}

/// Detects a client-side redirect in `html`.
///
/// Results, including "nothing found", are cached per original URL and body
/// hash: positives for the regular TTL, negatives for the negative TTL.
pub fn detect_client_side_redirect(
    ctx: &HistoryContext,
    html: &str,
    original_url: &str,
) -> Option<ClientRedirectDetail> {
    let cache_key = format!(
        "client-side-redirect:{}:{}",
        original_url,
        content_fingerprint(html)
    );
    if let Some(cached) = ctx.cache.client_side.get(&cache_key) {
        ctx.stats.increment_info(InfoType::CacheHit);
        return cached;
    }

    let detail = detect(html, original_url);

    let ttl = match &detail {
        Some(found) => {
            log::debug!("Found {}: {}", found.kind, found.message);
            ctx.stats.increment_info(InfoType::ClientSideRedirect);
            ctx.config.cache_ttl_secs
        }
        None => ctx.config.negative_cache_ttl_secs,
    };
    ctx.cache.client_side.set(cache_key, detail.clone(), Some(ttl));
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_value(RedirectKind::JsTimeoutRedirect).unwrap(),
            "js-timeout-redirect"
        );
        assert_eq!(RedirectKind::MetaRefresh.to_string(), "meta-refresh");
    }

    #[test]
    fn test_detect_client_side_redirect_caches_both_outcomes() {
        let ctx = HistoryContext::new(Config::default()).unwrap();
        let html = r#"<meta http-equiv="refresh" content="5;url=/new">"#;

        let first = detect_client_side_redirect(&ctx, html, "http://example.com/").unwrap();
        assert_eq!(first.target_url, "http://example.com/new");
        let second = detect_client_side_redirect(&ctx, html, "http://example.com/").unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.stats.get_info_count(InfoType::CacheHit), 1);
        assert_eq!(ctx.stats.get_info_count(InfoType::ClientSideRedirect), 1);

        assert!(detect_client_side_redirect(&ctx, "<p>plain</p>", "http://example.com/").is_none());
        assert_eq!(ctx.cache.client_side.stats().size, 2);
    }

    #[test]
    fn test_same_length_bodies_do_not_collide() {
        let ctx = HistoryContext::new(Config::default()).unwrap();
        let a = r#"<script>window.location = "https://aaa.org/";</script>"#;
        let b = r#"<script>window.location = "https://bbb.org/";</script>"#;
        assert_eq!(a.len(), b.len());
        let first = detect_client_side_redirect(&ctx, a, "http://example.com/").unwrap();
        let second = detect_client_side_redirect(&ctx, b, "http://example.com/").unwrap();
        assert_ne!(first.target_url, second.target_url);
    }

    #[test]
    fn test_third_party_targets_are_reported() {
        let ctx = HistoryContext::new(Config::default()).unwrap();
        let html = r#"<script>window.location = "https://www.facebook.com/sharer";</script>"#;
        let detail = detect_client_side_redirect(&ctx, html, "http://example.com/").unwrap();
        assert_eq!(detail.kind, RedirectKind::JsRedirect);
        assert_eq!(detail.target_url, "https://www.facebook.com/sharer");

        let html = r#"<script>window.location = "https://www.broadstreet.com/";</script>"#;
        let detail = detect_client_side_redirect(&ctx, html, "http://example.com/").unwrap();
        assert_eq!(detail.target_url, "https://www.broadstreet.com/");

        let html = r#"<meta http-equiv="refresh" content="0;url=https://www.google.com/">"#;
        let detail = detect_client_side_redirect(&ctx, html, "http://example.com/").unwrap();
        assert_eq!(detail.kind, RedirectKind::MetaRefresh);
        assert_eq!(detail.target_url, "https://www.google.com/");
    }

    #[test]
    fn test_first_match_is_kept_over_later_strategies() {
        let ctx = HistoryContext::new(Config::default()).unwrap();
        let html = r#"<script>
            window.location = "https://www.facebook.com/page";
            setTimeout(function() { window.location = "https://realsite.org/"; }, 2000);
        </script>"#;
        let detail = detect_client_side_redirect(&ctx, html, "http://example.com/").unwrap();
        assert_eq!(Some(detail), detect(html, "http://example.com/"));
    }
}
