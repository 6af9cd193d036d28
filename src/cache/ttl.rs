//! In-memory key/value store with per-entry expiry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Serialize;

struct CacheEntry<V> {
    value: V,
    /// `None` never expires
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Size and key listing of a cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

/// TTL cache shared by concurrent tasks.
///
/// Expired entries are only evicted lazily, when `get` (or `has`) touches them.
/// There is no size bound; lifetime is one process run.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns a clone of the value, evicting it first if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let expired = entries.get(key)?.is_expired(Instant::now());
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Stores `value`; a TTL of `None` or zero never expires.
    pub fn set(&self, key: impl Into<String>, value: V, ttl_secs: Option<u64>) {
        let expires_at = ttl_secs
            .filter(|secs| *secs > 0)
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        self.lock()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// View of `get`: expired entries are evicted and report `false`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes every key matching `pattern` (a regular expression).
    ///
    /// Returns the number of removed entries.
    pub fn invalidate(&self, pattern: &str) -> Result<usize, regex::Error> {
        let re = Regex::new(pattern)?;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !re.is_match(key));
        Ok(before - entries.len())
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Current size and keys (expired-but-untouched entries included).
    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        CacheStats {
            size: entries.len(),
            keys,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
