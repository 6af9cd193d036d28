//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, cache lifetimes, denylists)
//! - Browser header set and User-Agent pool
//! - CLI option types and parsing

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{Config, LogFormat, LogLevel, Opt};
