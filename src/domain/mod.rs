//! Domain extraction and URL normalization utilities.
//!
//! Archived URLs come in every shape (schemeless, explicit ports, relative
//! paths), so these helpers are deliberately lenient: they never fail, they
//! fall back to the input instead.
//!
//! Key functions:
//! - `extract_domain()` - Host of a URL without a leading `www.`
//! - `normalize_target()` - Absolute URL for a redirect target found in a page
//! - `explicit_port()` - Port written out in a URL, if any
//! - `normalize_domain_input()` - Validates a user-supplied domain

use std::sync::LazyLock;

use regex::Regex;

const EXPLICIT_PORT_PATTERN: &str = r":(\d+)";
const DOMAIN_INPUT_PATTERN: &str = r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)+$";

static EXPLICIT_PORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(EXPLICIT_PORT_PATTERN).expect("Failed to compile port regex - this is a bug")
});
static DOMAIN_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DOMAIN_INPUT_PATTERN).expect("Failed to compile domain regex - this is a bug")
});

/// Prefixes `https://` when the URL carries no scheme.
fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Host of `url` (lowercase), or `None` if it does not parse.
pub fn extract_host(url: &str) -> Option<String> {
    url::Url::parse(&with_scheme(url))
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

/// Host of `url` without a leading `www.`.
///
/// Falls back to the input when the URL cannot be parsed.
pub fn extract_domain(url: &str) -> String {
    match extract_host(url) {
        Some(host) => host.strip_prefix("www.").unwrap_or(&host).to_string(),
        None => url.to_string(),
    }
}

/// Makes a redirect target absolute.
///
/// Root-relative paths are resolved against the original URL's domain and
/// anything without a scheme gets `http://`.
pub fn normalize_target(target: &str, original_url: &str) -> String {
    if target.starts_with('/') {
        format!("http://{}{}", extract_domain(original_url), target)
    } else if !target.starts_with("http") {
        format!("http://{}", target)
    } else {
        target.to_string()
    }
}

/// Port written out in `url` (`http://example.com:80/` gives `Some(80)`).
pub fn explicit_port(url: &str) -> Option<u16> {
    EXPLICIT_PORT_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Validates a user-supplied domain and reduces it to a bare host.
///
/// Accepts `example.com`, `https://www.example.com/path` and similar; returns
/// `None` for blank or malformed input. A leading `www.` is dropped because
/// the URL variants add it back.
pub fn normalize_domain_input(input: &str) -> Option<String> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }
    let without_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(&trimmed);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);

    DOMAIN_INPUT_RE
        .is_match(host)
        .then(|| host.to_string())
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
