//! Shared state for domain checks.
//!
//! The `HistoryContext` groups every resource a domain check touches: the
//! configuration, the HTTP clients, the cache, the network health monitor
//! and the statistics counters. It is created by the caller and passed to
//! [`check_domain_history`](crate::check_domain_history) explicitly, so two
//! contexts never share state by accident.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ArchiveCache;
use crate::config::{Config, HEALTH_FAILURE_THRESHOLD, HEALTH_WARNING_COOLDOWN_SECS};
use crate::error_handling::{InitializationError, ProcessingStats};
use crate::health::NetworkHealthMonitor;
use crate::initialization::{init_client, init_redirect_client};

/// Context containing all shared resources needed for a domain check.
///
/// Cheap to clone; clones share the same cache, monitor and counters.
#[derive(Clone)]
pub struct HistoryContext {
    /// Tunables for this context
    pub config: Arc<Config>,
    /// HTTP client for CDX queries and snapshot bodies (redirects followed)
    pub client: Arc<reqwest::Client>,
    /// HTTP client for redirect classification (redirects disabled)
    pub redirect_client: Arc<reqwest::Client>,
    /// Memoized archive data; entries expire by TTL only
    pub cache: Arc<ArchiveCache>,
    /// Consecutive-failure tracker shared by every request
    pub health: Arc<NetworkHealthMonitor>,
    /// Error and info counters for the current check
    pub stats: Arc<ProcessingStats>,
}

impl HistoryContext {
    /// Creates a new context, building both HTTP clients from `config`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if a client cannot be built.
    pub fn new(config: Config) -> Result<Self, InitializationError> {
        let client = init_client(&config)?;
        let redirect_client = init_redirect_client(&config)?;
        let health = NetworkHealthMonitor::with_settings(
            HEALTH_FAILURE_THRESHOLD,
            Duration::from_secs(HEALTH_WARNING_COOLDOWN_SECS),
            Duration::from_secs(config.health_pause_secs),
        );
        Ok(Self {
            config: Arc::new(config),
            client,
            redirect_client,
            cache: Arc::new(ArchiveCache::new()),
            health: Arc::new(health),
            stats: Arc::new(ProcessingStats::new()),
        })
    }

    /// Prepares the context for a new domain check.
    ///
    /// Resets the health monitor and the counters. The cache is left alone;
    /// its entries only go away through their TTL.
    pub fn reset(&self) {
        self.health.reset();
        self.stats.reset();
    }

    /// Releases cached data. Clones of this context see an empty cache.
    pub fn dispose(self) {
        let stats = self.cache.stats();
        self.cache.clear();
        log::debug!("Disposed history context ({} cache entries dropped)", stats.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::{ErrorType, InfoType};

    #[test]
    fn test_reset_clears_health_and_stats_but_not_cache() {
        let ctx = HistoryContext::new(Config::default()).unwrap();
        ctx.cache.text.set("final-redirects:example.com", "x".into(), None);
        for _ in 0..5 {
            ctx.health.record_error();
        }
        ctx.stats.increment_error(ErrorType::CdxPageError);
        ctx.stats.increment_info(InfoType::CacheHit);

        ctx.reset();
        assert!(ctx.health.is_healthy());
        assert_eq!(ctx.stats.total_errors(), 0);
        assert_eq!(ctx.stats.total_info(), 0);
        assert!(ctx.cache.text.has("final-redirects:example.com"));
    }

    #[test]
    fn test_dispose_clears_shared_cache() {
        let ctx = HistoryContext::new(Config::default()).unwrap();
        let other = ctx.clone();
        ctx.cache.text.set("k", "v".into(), None);
        ctx.dispose();
        assert_eq!(other.cache.stats().size, 0);
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = HistoryContext::new(Config::default()).unwrap();
        let b = HistoryContext::new(Config::default()).unwrap();
        a.cache.text.set("k", "v".into(), None);
        a.health.record_error();
        assert!(!b.cache.text.has("k"));
        assert_eq!(b.health.consecutive_failures(), 0);
    }
}
