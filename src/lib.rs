//! wayback_redirects library: a domain's redirect history from the Wayback Machine
//!
//! Given a domain, the library queries the archive's CDX index across the URL
//! spellings the domain was crawled under, classifies archived 3xx captures by
//! their redirect target, inspects archived 200 captures for meta-refresh and
//! JavaScript redirects, optionally collects page titles, and renders it all
//! as a plain-text report split into message-sized chunks.
//!
//! # Example
//!
//! ```no_run
//! use wayback_redirects::{check_domain_history, Config, HistoryContext};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = HistoryContext::new(Config {
//!     include_titles: true,
//!     ..Default::default()
//! })?;
//!
//! let report = check_domain_history(&ctx, "example.com").await;
//! for chunk in &report.message_chunks {
//!     println!("{}", chunk);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Requests go to the public archive
//! unless `Config::archive_base_url` points elsewhere; the default pacing is
//! deliberately slow to stay within its rate limits.

pub mod cache;
pub mod config;
mod context;
pub mod detection;
mod domain;
pub mod error_handling;
pub mod executor;
pub mod fetch;
pub mod health;
pub mod initialization;
pub mod report;
pub mod server;
mod utils;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Opt};
pub use context::HistoryContext;
pub use domain::normalize_domain_input;
pub use report::{check_domain_history, HistoryReport};
pub use utils::ExecutionTime;
