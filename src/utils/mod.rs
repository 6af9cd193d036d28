//! Utility functions shared across the pipeline.
//!
//! This module provides:
//! - Jittered exponential backoff for retry strategies
//! - Pre-request jitter
//! - Execution timing for domain checks

mod backoff;
mod timing;

pub use backoff::{request_jitter, JitteredBackoff};
pub use timing::{ExecutionTime, ExecutionTimer};
