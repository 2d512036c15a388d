//! Multicast Invalidation Module
//!
//! Best-effort cross-process invalidation: every datagram on the configured
//! group carries one ASCII key prefix, and each listening process removes the
//! matching entries from its store. Nothing is acknowledged or ordered.

mod listener;
pub mod protocol;
mod sender;

pub use listener::{InvalidationListener, ListenerHandle};
pub use sender::InvalidationSender;
