//! Value Holder Module
//!
//! Values may be held strongly, weakly, or softly. A weak or soft holder can
//! stop resolving independently of the entry's TTL; the store treats that as
//! a miss.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

// == Holder ==
/// How a cached value is held by its entry.
#[derive(Debug)]
pub enum Holder<V> {
    /// The entry keeps the value alive.
    Strong(Arc<V>),
    /// The entry never keeps the value alive; it resolves only while some
    /// other owner still holds an `Arc`.
    Weak(Weak<V>),
    /// The entry keeps the value alive until the soft reference is reclaimed.
    Soft(SoftRef<V>),
}

impl<V> Holder<V> {
    /// Holds `value` strongly.
    pub fn strong(value: V) -> Self {
        Holder::Strong(Arc::new(value))
    }

    /// Holds a weak reference to `value`.
    pub fn weak(value: &Arc<V>) -> Self {
        Holder::Weak(Arc::downgrade(value))
    }

    // == Resolve ==
    /// Returns the referent, or `None` once it has been reclaimed.
    pub fn resolve(&self) -> Option<Arc<V>> {
        match self {
            Holder::Strong(value) => Some(Arc::clone(value)),
            Holder::Weak(weak) => weak.upgrade(),
            Holder::Soft(soft) => soft.get(),
        }
    }

    /// Returns true when the referent can no longer be resolved.
    pub fn is_reclaimed(&self) -> bool {
        match self {
            Holder::Strong(_) => false,
            Holder::Weak(weak) => weak.strong_count() == 0,
            Holder::Soft(soft) => soft.is_reclaimed(),
        }
    }
}

impl<V> Clone for Holder<V> {
    fn clone(&self) -> Self {
        match self {
            Holder::Strong(value) => Holder::Strong(Arc::clone(value)),
            Holder::Weak(weak) => Holder::Weak(Weak::clone(weak)),
            Holder::Soft(soft) => Holder::Soft(soft.clone()),
        }
    }
}

// == Soft Reference ==
/// A strong reference that can be dropped on demand.
///
/// Clones share the same slot, so the application can keep one clone as a
/// reclamation handle (for instance in a memory-pressure hook) while the cache
/// holds another.
#[derive(Debug)]
pub struct SoftRef<V> {
    slot: Arc<RwLock<Option<Arc<V>>>>,
}

impl<V> SoftRef<V> {
    pub fn new(value: V) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc(value: Arc<V>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(value))),
        }
    }

    /// Returns the referent if it has not been reclaimed.
    pub fn get(&self) -> Option<Arc<V>> {
        self.slot.read().clone()
    }

    /// Drops the referent. Every clone of this reference resolves to `None`
    /// afterwards.
    pub fn reclaim(&self) {
        self.slot.write().take();
    }

    pub fn is_reclaimed(&self) -> bool {
        self.slot.read().is_none()
    }
}

impl<V> Clone for SoftRef<V> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_always_resolves() {
        let holder = Holder::strong("value".to_string());
        assert_eq!(holder.resolve().as_deref(), Some(&"value".to_string()));
        assert!(!holder.is_reclaimed());
    }

    #[test]
    fn test_weak_resolves_while_owner_alive() {
        let owner = Arc::new(42u32);
        let holder = Holder::weak(&owner);

        assert_eq!(holder.resolve().as_deref(), Some(&42));

        drop(owner);
        assert!(holder.resolve().is_none());
        assert!(holder.is_reclaimed());
    }

    #[test]
    fn test_soft_reclaim_is_shared_between_clones() {
        let soft = SoftRef::new(7u8);
        let handle = soft.clone();
        let holder = Holder::Soft(soft);

        assert_eq!(holder.resolve().as_deref(), Some(&7));

        handle.reclaim();
        assert!(holder.resolve().is_none());
        assert!(holder.is_reclaimed());
    }

    #[test]
    fn test_soft_keeps_value_alive() {
        let value = Arc::new("kept".to_string());
        let soft = SoftRef::from_arc(Arc::clone(&value));
        drop(value);

        assert_eq!(soft.get().as_deref(), Some(&"kept".to_string()));
    }
}
