//! Buffered archive responses.
//!
//! Bodies are read once and stored as decoded data so they can be cached
//! and read any number of times.

use reqwest::header::{CONTENT_TYPE, LOCATION};
use serde_json::Value;

use crate::error_handling::FetchError;

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedBody {
    /// Body served as `application/json`
    Json(Value),
    /// Any other body (HTML, plain text, empty)
    Text(String),
}

/// A fully-read response: status, headers and decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    /// Header names are lowercase
    pub headers: Vec<(String, String)>,
    pub body: CachedBody,
}

impl CachedResponse {
    /// Reads the body, decoding JSON when the content type says so.
    ///
    /// An empty JSON body is kept as empty text instead of failing to decode.
    pub async fn from_response(response: reqwest::Response) -> Result<Self, FetchError> {
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let text = response.text().await?;

        let body = if is_json && !text.trim().is_empty() {
            CachedBody::Json(serde_json::from_str(&text)?)
        } else {
            CachedBody::Text(text)
        };
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn location(&self) -> Option<&str> {
        self.header(LOCATION.as_str())
            .filter(|location| !location.trim().is_empty())
    }

    /// Body as text; JSON bodies are re-serialized.
    pub fn text(&self) -> String {
        match &self.body {
            CachedBody::Json(value) => value.to_string(),
            CachedBody::Text(text) => text.clone(),
        }
    }

    /// Body as JSON; text bodies are parsed on demand.
    pub fn json(&self) -> Result<Value, FetchError> {
        match &self.body {
            CachedBody::Json(value) => Ok(value.clone()),
            CachedBody::Text(text) => Ok(serde_json::from_str(text)?),
        }
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: CachedBody) -> CachedResponse {
        CachedResponse {
            status: 301,
            headers: vec![("location".into(), "https://new.example.com/".into())],
            body,
        }
    }

    #[test]
    fn test_json_and_text_views() {
        let r = response(CachedBody::Json(json!([["timestamp"], ["20240101000000"]])));
        assert_eq!(r.text(), r#"[["timestamp"],["20240101000000"]]"#);
        assert_eq!(r.json().unwrap()[1][0], "20240101000000");

        let r = response(CachedBody::Text("[[1]]".into()));
        assert_eq!(r.json().unwrap(), json!([[1]]));
        assert!(response(CachedBody::Text("<html>".into())).json().is_err());
    }

    #[test]
    fn test_header_lookup() {
        let r = response(CachedBody::Text(String::new()));
        assert_eq!(r.header("Location"), Some("https://new.example.com/"));
        assert_eq!(r.location(), Some("https://new.example.com/"));
        assert!(r.header("content-type").is_none());
        assert!(r.is_redirect());
        assert!(!r.is_ok());
    }

    fn upstream(content_type: &str, body: &'static str) -> reqwest::Response {
        let response = axum::http::Response::builder()
            .status(200)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .unwrap();
        reqwest::Response::from(response)
    }

    #[tokio::test]
    async fn test_body_decoding_follows_content_type() {
        let html = CachedResponse::from_response(upstream("text/html", "<html></html>"))
            .await
            .unwrap();
        assert_eq!(html.body, CachedBody::Text("<html></html>".into()));
        assert!(html.is_ok());

        let json = CachedResponse::from_response(upstream("application/json", "[[1]]"))
            .await
            .unwrap();
        assert_eq!(json.body, CachedBody::Json(json!([[1]])));

        let empty = CachedResponse::from_response(upstream("application/json", "  "))
            .await
            .unwrap();
        assert_eq!(empty.body, CachedBody::Text("  ".into()));
    }
}
