//! Sweep Cache - An in-process TTL cache
//!
//! Provides a key/value store with per-entry TTL expiration, a sweeper that
//! starts on demand and retires when idle, weak/soft value holders,
//! best-effort multicast prefix invalidation, and a bounded LRU cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod multicast;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, LruCache};
pub use config::Config;
