//! API handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, info};

use super::types::{ApiResponse, WaybackRequest};
use crate::context::HistoryContext;
use crate::domain::normalize_domain_input;
use crate::error_handling::ApiErrorKind;
use crate::report::check_domain_history;

/// `POST /api/wayback`
pub async fn wayback_handler(
    State(ctx): State<HistoryContext>,
    body: Result<Json<WaybackRequest>, JsonRejection>,
) -> Response {
    let raw = match body {
        Ok(Json(WaybackRequest {
            domain: Some(domain),
        })) if !domain.trim().is_empty() => domain,
        Ok(_) => return invalid_domain(),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            return invalid_domain();
        }
    };
    let Some(domain) = normalize_domain_input(&raw) else {
        debug!("Rejected domain input: {:?}", raw);
        return invalid_domain();
    };

    info!("API check requested for {}", domain);
    let report = check_domain_history(&ctx, &domain).await;
    let response = if report.is_error() {
        debug!(
            "Check for {} ended with {}",
            domain,
            ApiErrorKind::AssemblyFailed.as_str()
        );
        ApiResponse::failure(ApiErrorKind::AssemblyFailed, Some(report))
    } else {
        ApiResponse::success(report)
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// `GET /health`
pub async fn health_handler() -> &'static str {
    "ok"
}

fn invalid_domain() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::failure(ApiErrorKind::InvalidDomain, None)),
    )
        .into_response()
}
