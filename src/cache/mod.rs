//! Memoization of archive data.
//!
//! [`TtlCache`] is the generic key/value store. [`ArchiveCache`] bundles one
//! typed cache per kind of value the pipeline memoizes, so every entry is
//! stored as plain decoded data.

mod ttl;

pub use ttl::{CacheStats, TtlCache};

use crate::detection::ClientRedirectDetail;
use crate::fetch::{CachedResponse, RedirectInfo, Snapshot};
use crate::report::ClientSideHit;

/// All caches used by one [`HistoryContext`](crate::HistoryContext).
///
/// Key prefixes identify what an entry holds, e.g. `page:<url>`,
/// `redirect-target:<ts>:<url>` or `final-redirects:<domain>`.
#[derive(Default)]
pub struct ArchiveCache {
    /// Buffered archive responses (`page:` and other request cache keys)
    pub responses: TtlCache<CachedResponse>,
    /// Snapshot lists (`snapshots:`, `3xx-snapshots:`, `200-snapshots:`, `page-snapshots:`)
    pub snapshots: TtlCache<Vec<Snapshot>>,
    /// Classifier results, negative results included
    pub redirects: TtlCache<Option<RedirectInfo>>,
    /// Client-side detection results, negative results included
    pub client_side: TtlCache<Option<ClientRedirectDetail>>,
    /// Per-domain client-side detections
    pub client_side_hits: TtlCache<Vec<ClientSideHit>>,
    /// Formatted entries, titles and final report sections
    pub text: TtlCache<String>,
}

impl ArchiveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combined size and keys across every typed cache.
    pub fn stats(&self) -> CacheStats {
        let parts = [
            self.responses.stats(),
            self.snapshots.stats(),
            self.redirects.stats(),
            self.client_side.stats(),
            self.client_side_hits.stats(),
            self.text.stats(),
        ];
        let mut keys: Vec<String> = parts.into_iter().flat_map(|s| s.keys).collect();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
        }
    }

    /// Removes matching keys from every typed cache.
    pub fn invalidate(&self, pattern: &str) -> Result<usize, regex::Error> {
        Ok(self.responses.invalidate(pattern)?
            + self.snapshots.invalidate(pattern)?
            + self.redirects.invalidate(pattern)?
            + self.client_side.invalidate(pattern)?
            + self.client_side_hits.invalidate(pattern)?
            + self.text.invalidate(pattern)?)
    }

    pub fn clear(&self) {
        self.responses.clear();
        self.snapshots.clear();
        self.redirects.clear();
        self.client_side.clear();
        self.client_side_hits.clear();
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_cache_stats_and_invalidate() {
        let cache = ArchiveCache::new();
        cache.text.set("final-redirects:example.com", "x".into(), None);
        cache.text.set("final-titles:example.com", "y".into(), None);
        cache.redirects.set("redirect-target:1:http://example.com/", None, Some(60));
        cache.snapshots.set("3xx-snapshots:other.org", Vec::new(), Some(60));

        let stats = cache.stats();
        assert_eq!(stats.size, 4);
        assert_eq!(stats.keys[0], "3xx-snapshots:other.org");

        assert_eq!(cache.invalidate("example\\.com").unwrap(), 3);
        assert_eq!(cache.stats().size, 1);

        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_negative_results_are_cached() {
        let cache = ArchiveCache::new();
        cache.redirects.set("redirect-target:1:u", None, Some(60));
        // Cached "no redirect" is distinct from "not cached"
        assert_eq!(cache.redirects.get("redirect-target:1:u"), Some(None));
        assert_eq!(cache.redirects.get("redirect-target:2:u"), None);
    }
}
