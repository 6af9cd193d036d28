//! Denylist checks for redirect targets.
//!
//! Archived pages embed plenty of third-party URLs (XML namespaces, share
//! buttons, analytics snippets) that look like redirect targets to a regex.
//! Detection itself reports the first match unfiltered; these helpers are for
//! callers that want to post-filter a detection.

use super::{ClientRedirectDetail, RedirectKind};
use crate::config::{COMMON_SERVICE_DOMAINS, IGNORED_DOMAINS};
use crate::domain::extract_domain;

/// Whether `host` is, or is a subdomain of, an ignored domain.
pub fn is_ignored_domain(host: &str) -> bool {
    IGNORED_DOMAINS
        .iter()
        .any(|ignored| host == *ignored || host.ends_with(&format!(".{}", ignored)))
}

/// Whether `host` contains a common third-party service token.
pub fn is_common_service_domain(host: &str) -> bool {
    COMMON_SERVICE_DOMAINS
        .iter()
        .any(|token| host.contains(token))
}

/// Whether a detection points at a denylisted target.
///
/// Ignored domains apply to every kind; the broader service-token check only
/// applies to script-derived detections, since a meta refresh is an explicit
/// page-level instruction.
pub fn is_noise(detail: &ClientRedirectDetail) -> bool {
    let host = extract_domain(&detail.target_url).to_lowercase();
    if is_ignored_domain(&host) {
        return true;
    }
    match detail.kind {
        RedirectKind::MetaRefresh => false,
        RedirectKind::JsRedirect | RedirectKind::JsTimeoutRedirect => {
            is_common_service_domain(&host)
        }
    }
}
