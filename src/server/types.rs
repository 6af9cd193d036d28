//! Request and response bodies of the JSON API.

use serde::{Deserialize, Serialize};

use crate::error_handling::ApiErrorKind;
use crate::report::HistoryReport;

/// Body of `POST /api/wayback`
#[derive(Debug, Deserialize)]
pub struct WaybackRequest {
    #[serde(default)]
    pub domain: Option<String>,
}

/// Envelope returned by every API route
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HistoryReport>,
}

impl ApiResponse {
    pub fn success(report: HistoryReport) -> Self {
        Self {
            ok: true,
            error: None,
            data: Some(report),
        }
    }

    pub fn failure(kind: ApiErrorKind, report: Option<HistoryReport>) -> Self {
        Self {
            ok: false,
            error: Some(kind),
            data: report,
        }
    }
}
