//! URL variants queried for each domain.
//!
//! The CDX index keys captures by the exact URL that was crawled, so one site
//! is spread over scheme, `www.`, trailing slash, index page and explicit
//! port spellings. Each list below is queried variant by variant.

/// Variants searched for 3xx captures.
pub fn redirect_variants(domain: &str) -> Vec<String> {
    let mut variants = base_variants(domain);
    variants.extend([
        format!("{}/index.html", domain),
        format!("http://{}/index.html", domain),
        format!("https://{}/index.html", domain),
        format!("{}/index.php", domain),
        format!("http://{}/index.php", domain),
        format!("https://{}/index.php", domain),
        format!("http://{}:80", domain),
        format!("http://{}:80/", domain),
        format!("http://www.{}:80", domain),
        format!("http://www.{}:80/", domain),
        format!("https://{}:443", domain),
        format!("https://{}:443/", domain),
    ]);
    variants
}

/// Variants searched for 200 captures (client-side redirect candidates).
pub fn ok_variants(domain: &str) -> Vec<String> {
    base_variants(domain).into_iter().take(8).collect()
}

/// Variants searched for the page titles section.
pub fn page_variants(domain: &str) -> Vec<String> {
    vec![
        domain.to_string(),
        format!("http://{}", domain),
        format!("https://{}", domain),
        format!("http://www.{}", domain),
        format!("https://www.{}", domain),
        format!("{}/", domain),
        format!("http://{}/", domain),
        format!("https://www.{}/", domain),
        format!("{}/index.html", domain),
        format!("http://{}/index.html", domain),
        format!("https://{}/index.html", domain),
        format!("{}/index.php", domain),
        format!("http://{}/index.php", domain),
        format!("https://{}/index.php", domain),
    ]
}

/// Bare, scheme and `www.` spellings, without and then with a trailing slash.
fn base_variants(domain: &str) -> Vec<String> {
    vec![
        domain.to_string(),
        format!("http://{}", domain),
        format!("https://{}", domain),
        format!("http://www.{}", domain),
        format!("https://www.{}", domain),
        format!("{}/", domain),
        format!("http://{}/", domain),
        format!("https://{}/", domain),
        format!("http://www.{}/", domain),
        format!("https://www.{}/", domain),
    ]
}
