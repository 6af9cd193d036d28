//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions (initialization, archive fetches, request layer)
//! - Processing statistics tracking (errors and info metrics)
//! - Retry strategy configuration
//! - Error categorization
//!
//! Error types are categorized into:
//! - **Errors**: Failures that lose data or indicate upstream trouble
//! - **Info**: Informational metrics (cache hits, redirects found, health pauses)

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{
    categorize_fetch_error, categorize_reqwest_error, get_retry_strategy, update_error_stats,
};
pub use stats::ProcessingStats;
pub use types::{ApiErrorKind, ErrorType, FetchError, InfoType, InitializationError};
