// Domain module tests.

use super::*;

#[test]
fn test_extract_domain_strips_www() {
    assert_eq!(extract_domain("http://www.example.com/"), "example.com");
    assert_eq!(extract_domain("https://example.com/path?q=1"), "example.com");
    assert_eq!(extract_domain("www.example.com"), "example.com");
}

#[test]
fn test_extract_domain_drops_port() {
    assert_eq!(extract_domain("http://www.example.com:80/"), "example.com");
    assert_eq!(extract_host("https://example.com:443/").as_deref(), Some("example.com"));
}

#[test]
fn test_extract_domain_falls_back_to_input() {
    assert_eq!(extract_domain("http://"), "http://");
}

#[test]
fn test_normalize_target() {
    assert_eq!(
        normalize_target("/new", "http://www.example.com/"),
        "http://example.com/new"
    );
    assert_eq!(
        normalize_target("other.org/landing", "http://example.com/"),
        "http://other.org/landing"
    );
    assert_eq!(
        normalize_target("https://other.org/", "http://example.com/"),
        "https://other.org/"
    );
}

#[test]
fn test_explicit_port() {
    assert_eq!(explicit_port("http://example.com:80/"), Some(80));
    assert_eq!(explicit_port("https://www.example.com:443"), Some(443));
    assert_eq!(explicit_port("http://example.com:8080/index.html"), Some(8080));
    assert_eq!(explicit_port("http://example.com/"), None);
}

#[test]
fn test_normalize_domain_input() {
    assert_eq!(normalize_domain_input("example.com").as_deref(), Some("example.com"));
    assert_eq!(
        normalize_domain_input("  https://www.Example.com/some/path ").as_deref(),
        Some("example.com")
    );
    assert_eq!(normalize_domain_input("sub.example.co.uk").as_deref(), Some("sub.example.co.uk"));
    assert_eq!(normalize_domain_input(""), None);
    assert_eq!(normalize_domain_input("   "), None);
    assert_eq!(normalize_domain_input("not a domain"), None);
    assert_eq!(normalize_domain_input("localhost"), None);
    assert_eq!(normalize_domain_input("-bad.com"), None);
}
