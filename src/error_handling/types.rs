//! Error type definitions.
//!
//! This module defines all error and info types used throughout the application.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Failure of a single archive request.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request deadline elapsed before a response arrived.
    #[error("Request timeout - Wayback Machine is responding slowly")]
    Timeout,

    /// The archive answered with a status outside the acceptable set.
    #[error("HTTP error {0}")]
    Status(u16),

    /// Transport-level failure (connect, body read, redirect loop...).
    #[error("Request failed: {0}")]
    Request(#[from] ReqwestError),

    /// The body claimed to be JSON but did not parse.
    #[error("Invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Every attempt failed; `source` is the last attempt's error.
    #[error(
        "Failed after {attempts} attempts: The Wayback Machine is responding very slowly. Please try again later."
    )]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Everything the archive can throw at us is transient from our point of
    /// view, except a malformed request or a JSON body that will never parse.
    pub fn is_retriable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Status(_) => true,
            FetchError::Request(e) => !e.is_builder(),
            FetchError::Decode(_) | FetchError::RetriesExhausted { .. } => false,
        }
    }
}

/// Error kinds exposed by the JSON request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Missing, blank or unparseable domain in the request body.
    InvalidDomain,
    /// The report collapsed into a single `Error:` line.
    AssemblyFailed,
}

impl ApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::InvalidDomain => "invalid_domain",
            ApiErrorKind::AssemblyFailed => "assembly_failed",
        }
    }
}

/// Types of errors that can occur during a domain check.
///
/// This enum categorizes actual error conditions - failures that lose data
/// or indicate upstream problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // HTTP/Network errors
    HttpRequestTimeoutError,
    HttpRequestConnectError,
    HttpRequestStatusError,
    HttpRequestTooManyRequests,     // 429 Too Many Requests
    HttpRequestServiceUnavailable, // 503 Service Unavailable
    HttpRequestGatewayTimeout,     // 504 Gateway Timeout
    HttpRequestBodyError,
    HttpRequestDecodeError,
    HttpRequestOtherError,
    RetriesExhausted,
    // Pipeline stages
    CdxPageError,
    RedirectResolveError,
    SnapshotFetchError,
    TitleFetchError,
}

/// Types of informational metrics collected during a domain check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    CacheHit,
    HttpRedirect,       // 3xx with a usable Location header
    ClientSideRedirect, // meta refresh or JavaScript redirect
    PortHeuristic,      // target guessed from an explicit :80/:443/... port
    HealthPause,        // cooldown taken because the archive looked unhealthy
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::HttpRequestTimeoutError => "HTTP request timeout error",
            ErrorType::HttpRequestConnectError => "HTTP request connect error",
            ErrorType::HttpRequestStatusError => "HTTP request status error",
            ErrorType::HttpRequestTooManyRequests => "Too many requests (429)",
            ErrorType::HttpRequestServiceUnavailable => "Service Unavailable (503)",
            ErrorType::HttpRequestGatewayTimeout => "Gateway Timeout (504)",
            ErrorType::HttpRequestBodyError => "HTTP request body error",
            ErrorType::HttpRequestDecodeError => "HTTP request decode error",
            ErrorType::HttpRequestOtherError => "HTTP request other error",
            ErrorType::RetriesExhausted => "Retries exhausted",
            ErrorType::CdxPageError => "CDX page error",
            ErrorType::RedirectResolveError => "Redirect resolve error",
            ErrorType::SnapshotFetchError => "Snapshot fetch error",
            ErrorType::TitleFetchError => "Title fetch error",
        }
    }
}

impl InfoType {
    /// Returns a human-readable string representation of the info type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::CacheHit => "Cache hit",
            InfoType::HttpRedirect => "HTTP redirect",
            InfoType::ClientSideRedirect => "Client-side redirect",
            InfoType::PortHeuristic => "Port heuristic",
            InfoType::HealthPause => "Health pause",
        }
    }
}
