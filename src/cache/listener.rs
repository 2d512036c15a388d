//! Cache Observer Traits
//!
//! Capabilities through which values and embedding applications learn about
//! cache transitions.

use crate::cache::Cachable;

// == Cache Listener ==
/// Receives notice when the value it belongs to enters or leaves a cache.
///
/// Both methods default to no-ops so implementors only override what they
/// care about.
pub trait CacheListener<K: ?Sized = str>: Send + Sync {
    /// Called once after the value has been inserted under `key`.
    fn cached_event(&self, _key: &K) {}

    /// Called once after the value has been removed from under `key`.
    fn uncached_event(&self, _key: &K) {}
}

// == Cache Delegate ==
/// Store-wide observer notified on every cache and uncache transition.
///
/// Callbacks run inside the store's critical section and must not call back
/// into the store: its lock is not reentrant, so doing so deadlocks.
pub trait CacheDelegate<V>: Send + Sync {
    fn cached_object(&self, _key: &str, _value: &dyn Cachable<V>) {}

    fn uncached_object(&self, _key: &str, _value: &dyn Cachable<V>) {}
}

/// Delegate that ignores every notification. Installed by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelegate;

impl<V> CacheDelegate<V> for NoopDelegate {}
