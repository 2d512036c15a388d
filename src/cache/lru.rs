//! LRU Cache Module
//!
//! Fixed-capacity cache with least-recently-used eviction.
//!
//! Nodes live in a slab (`Vec` of slots plus a free list) and are linked into
//! an access-ordered list by index:
//! - Head = Least recently used
//! - Tail = Most recently used
//!
//! A hashmap points from each key to its slot, so lookups, moves to the tail
//! and evictions are all O(1).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheListener;

const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    listener: Option<Arc<dyn CacheListener<K>>>,
    prev: usize,
    next: usize,
}

// == LRU Cache ==
/// Bounded cache that evicts the least recently used entry once full.
pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    capacity: usize,
    observer: Option<Arc<dyn CacheListener<K>>>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity,
            observer: None,
        }
    }

    /// Installs a listener notified of every insertion and removal,
    /// in addition to the per-value listeners.
    pub fn set_observer(&mut self, observer: Arc<dyn CacheListener<K>>) {
        self.observer = Some(observer);
    }

    // == Put ==
    /// Inserts or replaces `key`, making it the most recently used entry.
    ///
    /// Returns the previous value when the key was already present. If the
    /// insertion pushes the cache over capacity, the least recently used entry
    /// is evicted.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value, None)
    }

    /// Like `put`, with a listener that receives this value's cached and
    /// uncached events.
    pub fn put_with_listener(
        &mut self,
        key: K,
        value: V,
        listener: Arc<dyn CacheListener<K>>,
    ) -> Option<V> {
        self.insert(key, value, Some(listener))
    }

    fn insert(
        &mut self,
        key: K,
        value: V,
        listener: Option<Arc<dyn CacheListener<K>>>,
    ) -> Option<V> {
        if let Some(&index) = self.map.get(&key) {
            self.detach(index);
            self.attach_tail(index);

            let node = self.node_mut(index);
            let previous = std::mem::replace(&mut node.value, value);
            let previous_listener = std::mem::replace(&mut node.listener, listener);

            self.notify_uncached(previous_listener.as_ref(), &key);
            self.notify_cached(index);
            return Some(previous);
        }

        let node = Node {
            key: key.clone(),
            value,
            listener,
            prev: NIL,
            next: NIL,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.map.insert(key, index);
        self.attach_tail(index);
        self.notify_cached(index);

        while self.map.len() > self.capacity {
            self.evict_lru();
        }
        None
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = *self.map.get(key)?;
        if index != self.tail {
            self.detach(index);
            self.attach_tail(index);
        }
        Some(&self.node(index).value)
    }

    /// Returns the value for `key` without changing its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).map(|&index| &self.node(index).value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    // == Remove ==
    /// Removes `key`, firing its uncached event.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.map.remove(key)?;
        Some(self.release(index))
    }

    /// Removes every entry, least recently used first.
    pub fn clear(&mut self) {
        while self.head != NIL {
            self.evict_lru();
        }
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates from the least to the most recently used entry.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let node = self.node(cursor);
            cursor = node.next;
            Some((&node.key, &node.value))
        })
    }

    // == Eviction ==
    fn evict_lru(&mut self) {
        let index = self.head;
        if index == NIL {
            return;
        }
        let key = self.node(index).key.clone();
        self.map.remove(&key);
        debug!("Evicting least recently used entry");
        self.release(index);
    }

    /// Unlinks and frees a slot already removed from the map.
    fn release(&mut self, index: usize) -> V {
        self.detach(index);
        let node = self.slots[index]
            .take()
            .expect("linked slot must be occupied");
        self.free.push(index);

        self.notify_uncached(node.listener.as_ref(), &node.key);
        node.value
    }

    // == List Maintenance ==
    fn detach(&mut self, index: usize) {
        let (prev, next) = {
            let node = self.node(index);
            (node.prev, node.next)
        };

        if prev == NIL {
            self.head = next;
        } else {
            self.node_mut(prev).next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.node_mut(next).prev = prev;
        }

        let node = self.node_mut(index);
        node.prev = NIL;
        node.next = NIL;
    }

    fn attach_tail(&mut self, index: usize) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(index);
            node.prev = old_tail;
            node.next = NIL;
        }

        if old_tail == NIL {
            self.head = index;
        } else {
            self.node_mut(old_tail).next = index;
        }
        self.tail = index;
    }

    fn node(&self, index: usize) -> &Node<K, V> {
        self.slots[index]
            .as_ref()
            .expect("linked slot must be occupied")
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<K, V> {
        self.slots[index]
            .as_mut()
            .expect("linked slot must be occupied")
    }

    // == Notifications ==
    fn notify_cached(&self, index: usize) {
        let node = self.node(index);
        if let Some(listener) = &node.listener {
            listener.cached_event(&node.key);
        }
        if let Some(observer) = &self.observer {
            observer.cached_event(&node.key);
        }
    }

    fn notify_uncached(&self, listener: Option<&Arc<dyn CacheListener<K>>>, key: &K) {
        if let Some(listener) = listener {
            listener.uncached_event(key);
        }
        if let Some(observer) = &self.observer {
            observer.uncached_event(key);
        }
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.map.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        cached: AtomicUsize,
        uncached: AtomicUsize,
    }

    impl<K: ?Sized> CacheListener<K> for Counting {
        fn cached_event(&self, _key: &K) {
            self.cached.fetch_add(1, Ordering::SeqCst);
        }

        fn uncached_event(&self, _key: &K) {
            self.uncached.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn keys<K: Clone + Hash + Eq, V>(cache: &LruCache<K, V>) -> Vec<K> {
        cache.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Every live key is linked exactly once and the list matches the map.
    fn assert_consistent<K: Clone + Hash + Eq, V>(cache: &LruCache<K, V>) {
        assert_eq!(cache.iter().count(), cache.map.len());
        assert!(cache.len() <= cache.capacity());
    }

    #[test]
    fn test_lru_new() {
        let cache: LruCache<String, u32> = LruCache::new(3);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_put_beyond_capacity_evicts_oldest() {
        let mut cache = LruCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.put("d", 4);

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert_eq!(keys(&cache), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = LruCache::new(2);
        cache.put(1, "a");
        cache.put(2, "b");
        assert_eq!(cache.get(&1), Some(&"a"));
        cache.put(3, "c");

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn test_second_oldest_evicted_after_refresh() {
        let mut cache = LruCache::new(4);
        for i in 0..4 {
            cache.put(i, i * 10);
        }
        cache.get(&0);
        cache.put(4, 40);

        assert!(cache.contains(&0));
        assert!(!cache.contains(&1));
        assert_eq!(keys(&cache), vec![2, 3, 0, 4]);
    }

    #[test]
    fn test_peek_does_not_refresh() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.peek("a"), Some(&1));
        cache.put("c", 3);

        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_reput_does_not_double_count() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.put("a", 10), Some(1));
        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec!["b", "a"]);
        assert_eq!(cache.peek("a"), Some(&10));
        assert_consistent(&cache);
    }

    #[test]
    fn test_capacity_zero_evicts_immediately() {
        let listener = Arc::new(Counting::default());
        let mut cache = LruCache::new(0);

        cache.put_with_listener("a", 1, listener.clone());

        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
        assert_eq!(listener.cached.load(Ordering::SeqCst), 1);
        assert_eq!(listener.uncached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_capacity_one_replaces_single_slot() {
        let mut cache = LruCache::new(1);
        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.len(), 1);
        assert!(!cache.contains("a"));
        assert_eq!(cache.get("b"), Some(&2));
        assert_consistent(&cache);
    }

    #[test]
    fn test_listener_fires_once_per_insertion_and_eviction() {
        let listener = Arc::new(Counting::default());
        let mut cache = LruCache::new(10);

        cache.put_with_listener("listener".to_string(), 0, listener.clone());
        for i in 1..100 {
            let key = i.to_string();
            assert!(cache.get(&key).is_none());
            cache.put(key.clone(), i);
            assert!(cache.get(&key).is_some());
        }

        assert!(cache.get("listener").is_none());
        assert_eq!(listener.cached.load(Ordering::SeqCst), 1);
        assert_eq!(listener.uncached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observer_sees_all_transitions() {
        let observer = Arc::new(Counting::default());
        let mut cache = LruCache::new(2);
        cache.set_observer(observer.clone());

        cache.put(1, ());
        cache.put(2, ());
        cache.put(3, ());
        cache.remove(&2);

        assert_eq!(observer.cached.load(Ordering::SeqCst), 3);
        assert_eq!(observer.uncached.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_and_slot_reuse() {
        let mut cache = LruCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.remove("b"), Some(2));
        assert_eq!(cache.remove("b"), None);
        cache.put("d", 4);

        assert_eq!(cache.slots.len(), 3, "freed slot should be reused");
        assert_eq!(keys(&cache), vec!["a", "c", "d"]);
        assert_consistent(&cache);
    }

    #[test]
    fn test_clear_fires_uncached_for_everything() {
        let observer = Arc::new(Counting::default());
        let mut cache = LruCache::new(5);
        cache.set_observer(observer.clone());
        for i in 0..4 {
            cache.put(i, i);
        }

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(observer.uncached.load(Ordering::SeqCst), 4);
        assert_consistent(&cache);
    }

    #[test]
    fn test_basic_lru_walk() {
        let mut cache = LruCache::new(10);
        assert!(cache.get(&0).is_none());
        cache.put(0, 0);
        assert!(cache.get(&0).is_some());

        for i in 1..100 {
            assert_consistent(&cache);
            assert!(cache.get(&i).is_none());
            cache.put(i, i);
            assert!(cache.get(&0).is_some());
            assert!(cache.get(&i).is_some());

            if i > 10 {
                assert!(cache.get(&(i - 10)).is_none());
            }
        }
    }
}
