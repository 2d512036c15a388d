//! Cache Store Module
//!
//! Main cache engine: a map of key to `Cachable` entry guarded by one lock,
//! with TTL expiration, prefix invalidation and a lazily started sweeper.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{
    Cachable, CacheDelegate, CacheEntry, CacheListener, CacheStats, Holder, NoopDelegate,
};
use crate::config::{Config, MulticastConfig};
use crate::tasks::{spawn_sweeper, SweeperHandle};

// == Cache Store ==
/// Handle to a cache store. Clones share the same entries, statistics and
/// sweeper.
pub struct CacheStore<V> {
    inner: Arc<StoreInner<V>>,
}

struct StoreInner<V> {
    state: Mutex<StoreState<V>>,
    sweeper: Mutex<Option<SweeperHandle>>,
    config: Config,
    runtime: Option<Handle>,
    closed: AtomicBool,
}

/// Everything guarded by the store lock.
struct StoreState<V> {
    entries: HashMap<String, Box<dyn Cachable<V>>>,
    stats: CacheStats,
    delegate: Arc<dyn CacheDelegate<V>>,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Send + Sync + 'static> CacheStore<V> {
    // == Constructor ==
    /// Creates a new store.
    ///
    /// The sweeper is spawned on the tokio runtime active at construction.
    /// Without one, expired entries are only removed lazily by `get`.
    pub fn new(config: &Config) -> Self {
        Self::with_runtime(config, Handle::try_current().ok())
    }

    /// Creates a new store whose sweeper runs on `runtime`.
    pub fn with_runtime(config: &Config, runtime: Option<Handle>) -> Self {
        if runtime.is_none() {
            debug!("No tokio runtime available, cache sweeper disabled");
        }

        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState {
                    entries: HashMap::new(),
                    stats: CacheStats::new(current_timestamp_ms()),
                    delegate: Arc::new(NoopDelegate),
                }),
                sweeper: Mutex::new(None),
                config: config.clone(),
                runtime,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Replaces the delegate notified on every cache transition.
    ///
    /// The delegate runs while this store's lock is held. Calling any method
    /// of the same store from a callback deadlocks; hand the work off to
    /// another task instead.
    pub fn set_delegate(&self, delegate: Arc<dyn CacheDelegate<V>>) {
        self.inner.state.lock().delegate = delegate;
    }

    // == Store ==
    /// Stores a value held strongly.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Time to live, `Duration::ZERO` = never expires by time
    pub fn store(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.store_holder(key, Holder::strong(value), ttl);
    }

    /// Stores a value through an explicit holder. A weak or soft holder makes
    /// the entry miss once its referent is reclaimed, even before the TTL.
    pub fn store_holder(&self, key: impl Into<String>, holder: Holder<V>, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry::new(key.clone(), holder, ttl);
        self.store_cachable(key, Box::new(entry));
    }

    /// Stores a value whose `listener` receives the entry's cached and
    /// uncached events. Like delegates, listeners run under the store lock
    /// and must not call back into this store.
    pub fn store_with_listener(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Duration,
        listener: Arc<dyn CacheListener>,
    ) {
        let key = key.into();
        let entry = CacheEntry::new(key.clone(), Holder::strong(value), ttl).with_listener(listener);
        self.store_cachable(key, Box::new(entry));
    }

    /// Stores a custom entry.
    ///
    /// A previous entry under the same key is uncached first.
    pub fn store_cachable(&self, key: impl Into<String>, entry: Box<dyn Cachable<V>>) {
        let now = current_timestamp_ms();
        {
            let mut state = self.inner.state.lock();
            state.stats.touch(now);
            state.insert(key.into(), entry);
        }
        self.ensure_sweeper();
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` when the key is unknown, the entry has expired, or its
    /// referent has been reclaimed. Expired entries found here are removed.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let now = current_timestamp_ms();
        let value = {
            let mut state = self.inner.state.lock();
            state.stats.touch(now);
            state.lookup(key, now)
        };
        self.ensure_sweeper();
        value
    }

    // == Uncache ==
    /// Removes an entry by key. Removing an unknown key is a no-op.
    pub fn uncache(&self, key: &str) {
        let now = current_timestamp_ms();
        {
            let mut state = self.inner.state.lock();
            state.stats.touch(now);
            if let Some(entry) = state.entries.remove(key) {
                state.discard(key, entry);
            }
        }
        self.ensure_sweeper();
    }

    // == Uncache Like ==
    /// Removes every entry whose key starts with `prefix` and returns how many
    /// were removed. An empty prefix matches every key.
    ///
    /// This does not count as a touch, so remote invalidations never keep an
    /// idle store alive.
    pub fn uncache_like(&self, prefix: &str) -> usize {
        let mut state = self.inner.state.lock();
        let keys: Vec<String> = state
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &keys {
            if let Some(entry) = state.entries.remove(key) {
                state.discard(key, entry);
            }
        }

        let len = state.entries.len();
        state.stats.observe_size(len);
        keys.len()
    }

    // == Sweep ==
    /// Removes every expired entry. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let mut state = self.inner.state.lock();
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(entry) = state.entries.remove(key) {
                debug!("{} expired", key);
                state.stats.record_expiration();
                state.discard(key, entry);
            }
        }

        let len = state.entries.len();
        state.stats.observe_size(len);
        expired.len()
    }

    // == Drain ==
    /// Removes every entry regardless of expiry. Returns the number removed.
    pub fn drain(&self) -> usize {
        let mut state = self.inner.state.lock();
        let drained: Vec<(String, Box<dyn Cachable<V>>)> = state.entries.drain().collect();
        let count = drained.len();

        for (key, entry) in drained {
            state.discard(&key, entry);
        }

        state.stats.observe_size(0);
        count
    }

    // == Sweeper Lifecycle ==
    /// Starts a sweeper unless one is already running.
    ///
    /// Every store, get and uncache calls this, so a sweeper that retired
    /// after an idle period is replaced on the next touch.
    pub fn ensure_sweeper(&self) {
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }
        let Some(runtime) = &self.inner.runtime else {
            return;
        };

        let mut slot = self.inner.sweeper.lock();
        // shutdown() may have closed the store and emptied the slot since the
        // check above; it sets the flag before taking this lock.
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }
        if slot.as_ref().is_some_and(SweeperHandle::is_alive) {
            return;
        }
        *slot = Some(spawn_sweeper(self.clone(), runtime));
    }

    /// Returns true while a sweeper task is alive for this store.
    pub fn sweeper_running(&self) -> bool {
        self.inner
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(SweeperHandle::is_alive)
    }

    /// Returns true while the sweeper runs an invalidation listener.
    pub fn listener_running(&self) -> bool {
        self.inner
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(SweeperHandle::is_listening)
    }

    // == Shutdown ==
    /// Stops the sweeper (which stops the invalidation listener) and empties
    /// the store. No sweeper is started afterwards; the store keeps serving
    /// calls with lazy expiry only.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let sweeper = self.inner.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper.stop().await;
        }
        self.drain();
    }

    // == Accessors ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        let mut stats = state.stats.clone();
        stats.total_entries = state.entries.len();
        stats
    }

    /// Milliseconds since the last store, get or uncache.
    pub fn use_age_ms(&self) -> u64 {
        self.inner
            .state
            .lock()
            .stats
            .use_age_ms(current_timestamp_ms())
    }

    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().entries.is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn multicast_config(&self) -> Option<MulticastConfig> {
        self.inner.config.multicast
    }
}

impl<V> StoreState<V> {
    fn insert(&mut self, key: String, entry: Box<dyn Cachable<V>>) {
        if let Some(previous) = self.entries.remove(&key) {
            self.discard(&key, previous);
        }
        self.entries.insert(key.clone(), entry);

        if let Some(entry) = self.entries.get(&key) {
            entry.cached_event(&key);
            self.delegate.cached_object(&key, &**entry);
        }

        self.stats.record_put();
        self.stats.observe_size(self.entries.len());
    }

    fn lookup(&mut self, key: &str, now: u64) -> Option<Arc<V>> {
        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return None;
        };

        let value = if entry.is_expired() {
            None
        } else {
            entry.cached_object()
        };

        match value {
            Some(value) => {
                entry.set_access_time(now);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                if let Some(expired) = self.entries.remove(key) {
                    debug!("{} expired on lookup", key);
                    self.stats.record_expiration();
                    self.discard(key, expired);
                }
                self.stats.record_miss();
                None
            }
        }
    }

    /// Fires the hooks for an entry already removed from the map.
    fn discard(&mut self, key: &str, entry: Box<dyn Cachable<V>>) {
        entry.uncached_event(key);
        self.delegate.uncached_object(key, &*entry);
        self.stats.observe_size(self.entries.len());
    }
}
