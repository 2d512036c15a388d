//! Background Tasks Module
//!
//! Contains the background tasks that run alongside a cache store.
//!
//! # Tasks
//! - Sweeper: removes expired entries, retires after an idle period and owns
//!   the invalidation listener

mod sweeper;

pub use sweeper::{spawn_sweeper, SweeperHandle};
