//! Client-side redirect strategies.
//!
//! Each strategy scans raw HTML for one family of redirect signals. They are
//! tried in [`DEFAULT_STRATEGIES`] order and the first match wins, so a page
//! with both a meta refresh and a script redirect reports the meta refresh.

use std::sync::LazyLock;

use regex::Regex;

use super::{ClientRedirectDetail, RedirectKind};
use crate::domain::normalize_target;

const META_REFRESH_PATTERN: &str =
    r#"(?i)<meta\s+http-equiv=["']?refresh["']?\s+content=["']?(\d+)(?:;\s*url=([^"'>]+))?["']?\s*/?>"#;

// Direct assignments and replace()/assign() calls, most common first
const JS_LOCATION_PATTERNS: &[&str] = &[
    r#"(?i)window\.location(?:\.href)?\s*=\s*["']([^"']+)["']"#,
    r#"(?i)window\.location\.replace\(["']([^"']+)["']\)"#,
    r#"(?i)window\.location\.assign\(["']([^"']+)["']\)"#,
    r#"(?i)document\.location(?:\.href)?\s*=\s*["']([^"']+)["']"#,
    r#"(?i)document\.location\.replace\(["']([^"']+)["']\)"#,
    r#"(?i)top\.location(?:\.href)?\s*=\s*["']([^"']+)["']"#,
    r#"(?i)self\.location(?:\.href)?\s*=\s*["']([^"']+)["']"#,
];

const COUNTDOWN_PATTERNS: &[&str] = &[
    r#"(?is)setInterval\s*\(\s*function\s*\(\s*\)\s*\{[^}]*countdown[^}]*\}\s*,\s*1000\s*\)"#,
    r#"(?is)setTimeout\s*\(\s*function\s*\(\s*\)\s*\{[^}]*(?:countdown|timer)[^}]*\}\s*,\s*1000\s*\)"#,
    r#"(?i)(?:const|let|var)\s+(?:countdown|timer)\s*=\s*(\d+)"#,
];

const COUNTDOWN_SECONDS_PATTERN: &str = r#"(?i)(\d+)\s*(?:second|sec|s)"#;

const JS_TIMEOUT_PATTERNS: &[&str] = &[
    r#"(?is)setTimeout\s*\(\s*function\s*\(\s*\)\s*\{[^}]*(?:location|window|document)\.(?:location|href)\s*=\s*["']([^"']+)["'][^}]*\}\s*,\s*(\d+)\s*\)"#,
    r#"(?is)setTimeout\s*\(\s*\(\s*\)\s*=>\s*\{[^}]*(?:location|window|document)\.(?:location|href)\s*=\s*["']([^"']+)["'][^}]*\}\s*,\s*(\d+)\s*\)"#,
    r#"(?is)setTimeout\s*\(\s*["'](?:location|window|document)\.(?:location|href)\s*=\s*\\?["']([^"']+)\\?["'][\s"']*\s*,\s*(\d+)\s*\)"#,
];

// Bodies of 3xx captures that lack a Location header
const FALLBACK_META_PATTERN: &str =
    r#"(?i)<meta\s+http-equiv=["']?refresh["']?\s+content=["']?\d+;\s*url=([^"'>]+)["']?\s*/?>"#;
const FALLBACK_LOCATION_PATTERN: &str =
    r#"(?i)(?:window\.location|location\.href)\s*=\s*["']([^"']+)["']"#;

/// Compiles a built-in regex pattern, panicking on failure.
///
/// Only used for the constant patterns of this module, which are covered by
/// the unit tests below.
fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

fn compile_all(patterns: &[&str], context: &str) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| compile_regex_unsafe(pattern, context))
        .collect()
}

static META_REFRESH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(META_REFRESH_PATTERN, "META_REFRESH_RE"));
static JS_LOCATION_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(JS_LOCATION_PATTERNS, "JS_LOCATION_RES"));
static COUNTDOWN_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(COUNTDOWN_PATTERNS, "COUNTDOWN_RES"));
static COUNTDOWN_SECONDS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(COUNTDOWN_SECONDS_PATTERN, "COUNTDOWN_SECONDS_RE"));
static JS_TIMEOUT_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(JS_TIMEOUT_PATTERNS, "JS_TIMEOUT_RES"));
static FALLBACK_META_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(FALLBACK_META_PATTERN, "FALLBACK_META_RE"));
static FALLBACK_LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(FALLBACK_LOCATION_PATTERN, "FALLBACK_LOCATION_RE"));

/// One family of client-side redirect signals.
pub trait RedirectStrategy: Send + Sync {
    /// Kind reported by this strategy's detections.
    fn kind(&self) -> RedirectKind;

    /// Scans `html`; relative targets are resolved against `original_url`.
    fn detect(&self, html: &str, original_url: &str) -> Option<ClientRedirectDetail>;
}

/// `<meta http-equiv="refresh" content="N;url=...">`
pub struct MetaRefreshStrategy;

/// Assignments to `window`/`document`/`top`/`self` location.
pub struct JsLocationStrategy;

/// `setTimeout` callbacks that assign a location.
pub struct JsTimeoutStrategy;

/// Strategies in priority order.
pub static DEFAULT_STRATEGIES: &[&dyn RedirectStrategy] =
    &[&MetaRefreshStrategy, &JsLocationStrategy, &JsTimeoutStrategy];

impl RedirectStrategy for MetaRefreshStrategy {
    fn kind(&self) -> RedirectKind {
        RedirectKind::MetaRefresh
    }

    fn detect(&self, html: &str, original_url: &str) -> Option<ClientRedirectDetail> {
        let caps = META_REFRESH_RE.captures(html)?;
        let delay: u64 = caps.get(1)?.as_str().parse().ok()?;
        let raw_target = caps.get(2).map_or(original_url, |m| m.as_str());
        let target_url = normalize_target(raw_target, original_url);
        Some(ClientRedirectDetail {
            kind: self.kind(),
            message: format!("Meta refresh redirect to {} after {} seconds", target_url, delay),
            target_url,
            delay_seconds: Some(delay as f64),
        })
    }
}

impl RedirectStrategy for JsLocationStrategy {
    fn kind(&self) -> RedirectKind {
        RedirectKind::JsRedirect
    }

    fn detect(&self, html: &str, original_url: &str) -> Option<ClientRedirectDetail> {
        let raw_target = JS_LOCATION_RES
            .iter()
            .find_map(|re| re.captures(html).and_then(|caps| caps.get(1)))?;
        let target_url = normalize_target(raw_target.as_str(), original_url);

        // A countdown script plus an "N seconds" string means a delayed redirect
        let delay = if COUNTDOWN_RES.iter().any(|re| re.is_match(html)) {
            COUNTDOWN_SECONDS_RE
                .captures(html)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
        } else {
            None
        };

        let message = match delay {
            Some(seconds) => format!("JavaScript redirect to {} after {} seconds", target_url, seconds),
            None => format!("JavaScript redirect to {}", target_url),
        };
        Some(ClientRedirectDetail {
            kind: self.kind(),
            target_url,
            delay_seconds: delay.map(|s| s as f64),
            message,
        })
    }
}

impl RedirectStrategy for JsTimeoutStrategy {
    fn kind(&self) -> RedirectKind {
        RedirectKind::JsTimeoutRedirect
    }

    fn detect(&self, html: &str, original_url: &str) -> Option<ClientRedirectDetail> {
        let (raw_target, millis) = JS_TIMEOUT_RES.iter().find_map(|re| {
            let caps = re.captures(html)?;
            let millis: u64 = caps.get(2)?.as_str().parse().ok()?;
            Some((caps.get(1)?.as_str(), millis))
        })?;
        let target_url = normalize_target(raw_target, original_url);
        let delay = millis as f64 / 1000.0;
        Some(ClientRedirectDetail {
            kind: self.kind(),
            message: format!(
                "JavaScript timed redirect to {} after {} seconds",
                target_url, delay
            ),
            target_url,
            delay_seconds: Some(delay),
        })
    }
}

/// Runs `strategies` in order and returns the first detection.
pub fn detect_with(
    strategies: &[&dyn RedirectStrategy],
    html: &str,
    original_url: &str,
) -> Option<ClientRedirectDetail> {
    strategies
        .iter()
        .find_map(|strategy| strategy.detect(html, original_url))
}

/// Raw target from the body of a 3xx capture without a Location header.
///
/// Looks for a meta refresh carrying a URL, then a `window.location` or
/// `location.href` assignment. The result is not normalized.
pub fn fallback_body_target(html: &str) -> Option<&str> {
    FALLBACK_META_RE
        .captures(html)
        .or_else(|| FALLBACK_LOCATION_RE.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
