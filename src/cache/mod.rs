//! Cache Module
//!
//! Provides the TTL cache store with weak/soft value holders and lifecycle
//! hooks, plus a standalone bounded LRU cache.

mod entry;
mod holder;
mod listener;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, Cachable, CacheEntry};
pub use holder::{Holder, SoftRef};
pub use listener::{CacheDelegate, CacheListener, NoopDelegate};
pub use lru::LruCache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes for the admin API
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes for the admin API
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
