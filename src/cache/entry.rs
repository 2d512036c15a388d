//! Cache Entry Module
//!
//! Defines the `Cachable` capability and the default TTL-based entry.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::cache::{CacheListener, Holder};

// == Cachable ==
/// Anything the cache store can hold.
///
/// The store calls these under its lock: `cached_event` right after
/// insertion, `uncached_event` right after removal, `is_expired` during
/// lookups and sweep passes, and `set_access_time` on every hit.
pub trait Cachable<V>: Send + Sync {
    /// Key this entry was created for.
    fn key(&self) -> &str;

    fn cached_event(&self, _key: &str) {}

    fn uncached_event(&self, _key: &str) {}

    /// Returns true once the entry must no longer be served.
    fn is_expired(&self) -> bool;

    /// Returns the cached value, or `None` if it has been reclaimed.
    fn cached_object(&self) -> Option<Arc<V>>;

    /// Records the time (Unix milliseconds) of the latest hit.
    fn set_access_time(&mut self, timestamp_ms: u64);
}

// == Cache Entry ==
/// Default entry: a held value with an optional expiration time.
pub struct CacheEntry<V> {
    key: String,
    holder: Holder<V>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Latest hit timestamp (Unix milliseconds)
    pub accessed_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    listener: Option<Arc<dyn CacheListener>>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `holder` - How the value is held
    /// * `ttl` - Time to live, `Duration::ZERO` = no time-based expiration
    pub fn new(key: impl Into<String>, holder: Holder<V>, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let expires_at = (!ttl.is_zero()).then(|| now.saturating_add(ttl.as_millis() as u64));

        Self {
            key: key.into(),
            holder,
            created_at: now,
            accessed_at: now,
            expires_at,
            listener: None,
        }
    }

    /// Attaches a listener that receives this entry's lifecycle events.
    pub fn with_listener(mut self, listener: Arc<dyn CacheListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn holder(&self) -> &Holder<V> {
        &self.holder
    }

    // == Time Expiry ==
    /// Checks the TTL alone.
    ///
    /// An entry is past its TTL once the current time is strictly greater
    /// than the expiration time.
    pub fn is_time_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

impl<V: Send + Sync> Cachable<V> for CacheEntry<V> {
    fn key(&self) -> &str {
        &self.key
    }

    fn cached_event(&self, key: &str) {
        debug!("Entry cached with key {}", key);
        if let Some(listener) = &self.listener {
            listener.cached_event(key);
        }
    }

    fn uncached_event(&self, key: &str) {
        debug!("Entry uncached with key {}", key);
        if let Some(listener) = &self.listener {
            listener.uncached_event(key);
        }
    }

    /// A reclaimed referent always counts as expired, whatever the TTL says.
    fn is_expired(&self) -> bool {
        self.holder.is_reclaimed() || self.is_time_expired()
    }

    fn cached_object(&self) -> Option<Arc<V>> {
        self.holder.resolve()
    }

    fn set_access_time(&mut self, timestamp_ms: u64) {
        self.accessed_at = timestamp_ms;
    }
}

impl<V: fmt::Debug> fmt::Debug for CacheEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("holder", &self.holder)
            .field("created_at", &self.created_at)
            .field("accessed_at", &self.accessed_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
