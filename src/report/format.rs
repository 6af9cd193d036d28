//! Report text: section headers, entries and timestamps.

use chrono::NaiveDateTime;

use super::ClientSideHit;
use crate::fetch::Snapshot;

pub const REDIRECTS_HEADER: &str = "3XX HTTP REDIRECTS\n=========\n";
pub const CLIENT_SIDE_HEADER: &str = "CLIENT-SIDE REDIRECTS\n=========\n";
pub const TITLES_HEADER: &str = "PAGE TITLES\n=========\n";

pub const NO_REDIRECTS: &str = "No 3XX HTTP redirects found\n";
pub const NO_CLIENT_SIDE: &str = "No client-side redirects found\n";
pub const NO_PAGES: &str = "No page snapshots found\n";

const UNKNOWN_DATE: &str = "Unknown date";

/// Renders `YYYYMMDDHHMMSS` as `HH:MM:SS <Month> D, YYYY`.
///
/// Anything shorter than 14 characters, or not a valid date, is
/// `Unknown date`.
pub fn format_wayback_timestamp(timestamp: &str) -> String {
    timestamp
        .get(..14)
        .and_then(|digits| NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok())
        .map(|dt| dt.format("%H:%M:%S %B %-d, %Y").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// `"<date>\n<status> - <original> -> <target>\n"`, target omitted if unknown.
pub fn format_redirect_entry(snapshot: &Snapshot, target_url: Option<&str>) -> String {
    let date = format_wayback_timestamp(&snapshot.timestamp);
    match target_url {
        Some(target) => format!(
            "{}\n{} - {} -> {}\n",
            date, snapshot.status_code, snapshot.original_url, target
        ),
        None => format!("{}\n{} - {}\n", date, snapshot.status_code, snapshot.original_url),
    }
}

/// Date, `original -> target`, then the kind with its delay when non-zero.
pub fn format_client_side_entry(hit: &ClientSideHit) -> String {
    let date = format_wayback_timestamp(&hit.snapshot.timestamp);
    let kind = match hit.detail.delay_seconds {
        Some(delay) if delay != 0.0 => {
            format!("Type: {} ({} second delay)", hit.detail.kind, delay)
        }
        _ => format!("Type: {}", hit.detail.kind),
    };
    format!(
        "{}\n{} -> {}\n{}\n\n",
        date, hit.snapshot.original_url, hit.detail.target_url, kind
    )
}

/// `"<date>  - <title>\n"`
pub fn format_title_entry(timestamp: &str, title: &str) -> String {
    format!("{}  - {}\n", format_wayback_timestamp(timestamp), title)
}

/// The CLIENT-SIDE REDIRECTS section for already-detected hits.
pub fn render_client_side_section(hits: &[ClientSideHit]) -> String {
    let mut text = CLIENT_SIDE_HEADER.to_string();
    if hits.is_empty() {
        text.push_str(NO_CLIENT_SIDE);
    } else {
        text.extend(hits.iter().map(format_client_side_entry));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{ClientRedirectDetail, RedirectKind};

    fn snapshot(ts: &str) -> Snapshot {
        Snapshot {
            timestamp: ts.into(),
            original_url: "http://example.com/".into(),
            status_code: "301".into(),
            digest: "D".into(),
        }
    }

    fn hit(kind: RedirectKind, delay: Option<f64>) -> ClientSideHit {
        ClientSideHit {
            snapshot: snapshot("20240326053735"),
            detail: ClientRedirectDetail {
                kind,
                target_url: "http://example.com/new".into(),
                delay_seconds: delay,
                message: String::new(),
            },
        }
    }

    #[test]
    fn test_format_wayback_timestamp() {
        assert_eq!(format_wayback_timestamp("20240326053735"), "05:37:35 March 26, 2024");
        assert_eq!(format_wayback_timestamp("20190105230000"), "23:00:00 January 5, 2019");
        assert_eq!(format_wayback_timestamp("2024032605373"), "Unknown date");
        assert_eq!(format_wayback_timestamp(""), "Unknown date");
        assert_eq!(format_wayback_timestamp("20241399000000"), "Unknown date");
    }

    #[test]
    fn test_format_redirect_entry() {
        let s = snapshot("20240326053735");
        assert_eq!(
            format_redirect_entry(&s, Some("https://new.example.com/")),
            "05:37:35 March 26, 2024\n301 - http://example.com/ -> https://new.example.com/\n"
        );
        assert_eq!(
            format_redirect_entry(&s, None),
            "05:37:35 March 26, 2024\n301 - http://example.com/\n"
        );
    }

    #[test]
    fn test_format_client_side_entry_delays() {
        assert_eq!(
            format_client_side_entry(&hit(RedirectKind::MetaRefresh, Some(5.0))),
            "05:37:35 March 26, 2024\nhttp://example.com/ -> http://example.com/new\nType: meta-refresh (5 second delay)\n\n"
        );
        assert!(format_client_side_entry(&hit(RedirectKind::JsTimeoutRedirect, Some(1.5)))
            .contains("Type: js-timeout-redirect (1.5 second delay)\n"));
        assert!(format_client_side_entry(&hit(RedirectKind::MetaRefresh, Some(0.0)))
            .ends_with("Type: meta-refresh\n\n"));
        assert!(format_client_side_entry(&hit(RedirectKind::JsRedirect, None))
            .ends_with("Type: js-redirect\n\n"));
    }

    #[test]
    fn test_render_client_side_section() {
        assert_eq!(
            render_client_side_section(&[]),
            "CLIENT-SIDE REDIRECTS\n=========\nNo client-side redirects found\n"
        );
        let text = render_client_side_section(&[hit(RedirectKind::JsRedirect, None)]);
        assert!(text.starts_with(CLIENT_SIDE_HEADER));
        assert!(text.contains("http://example.com/ -> http://example.com/new\n"));
    }

    #[test]
    fn test_format_title_entry() {
        assert_eq!(
            format_title_entry("20240326053735", "Example Domain"),
            "05:37:35 March 26, 2024  - Example Domain\n"
        );
    }
}
