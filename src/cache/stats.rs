//! Cache Statistics Module
//!
//! Tracks store activity: puts, hits, misses, expirations, the size
//! watermark and the time the store was last touched.

use serde::Serialize;

// == Cache Stats ==
/// Running counters attached to a cache store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of store operations
    pub puts: u64,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (unknown, expired or reclaimed)
    pub misses: u64,
    /// Number of entries removed because they expired
    pub expirations: u64,
    /// Highest entry count ever observed
    pub watermark: usize,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Unix milliseconds of the latest store, get or uncache
    pub last_touch: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats touched at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            last_touch: now_ms,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_put(&mut self) {
        self.puts += 1;
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Observe Size ==
    /// Updates the entry count and raises the watermark if needed.
    pub fn observe_size(&mut self, count: usize) {
        self.total_entries = count;
        self.watermark = self.watermark.max(count);
    }

    // == Touch ==
    pub fn touch(&mut self, now_ms: u64) {
        self.last_touch = now_ms;
    }

    // == Use Age ==
    /// Milliseconds elapsed since the store was last touched.
    pub fn use_age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_touch)
    }
}
