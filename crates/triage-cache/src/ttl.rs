use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Keys in insertion order. May lag behind `entries` (deleted or evicted
    /// keys are dropped lazily); compacted during eviction and `sweep`.
    insertion_order: VecDeque<K>,
    destroyed: bool,
}

/// Bounded key/value store with per-entry expiry.
///
/// Expired entries behave as absent and are deleted lazily on access, or in
/// bulk by [`sweep`](TtlCache::sweep). When an insert would exceed
/// `max_entries`, the single oldest-inserted live entry is evicted first:
/// FIFO by insertion order, not last access, which keeps every operation
/// O(1) amortized without access-order bookkeeping.
///
/// Callers only ever see cloned values; no reference into the internal
/// storage escapes.
pub struct TtlCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    default_ttl: Duration,
    max_entries: usize,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
                destroyed: false,
            }),
            default_ttl,
            // A zero bound would make every insert evict itself.
            max_entries: max_entries.max(1),
            sweeper: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        // A panic mid-operation cannot leave entries half-written, so a
        // poisoned lock is still safe to reuse.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a value under the default TTL.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store a value expiring at `now + ttl`. Overwriting an existing key
    /// keeps its position in the insertion order.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        let mut inner = self.lock();
        if inner.destroyed {
            return;
        }

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.value = value;
            entry.expires_at = expires_at;
            return;
        }

        if inner.entries.len() >= self.max_entries {
            // Skip queue residue from deleted keys until a live entry goes.
            while let Some(oldest) = inner.insertion_order.pop_front() {
                if inner.entries.remove(&oldest).is_some() {
                    break;
                }
            }
        }

        inner.insertion_order.push_back(key.clone());
        inner.entries.insert(key, Entry { value, expires_at });
    }

    /// The value for `key` if present and unexpired. An expired entry is
    /// deleted and reported absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.lock();
        match inner.entries.get(key) {
            Some(entry) if now <= entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Same lazy-expiry semantics as [`get`](TtlCache::get), without cloning.
    pub fn has(&self, key: &K) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();
        match inner.entries.get(key) {
            Some(entry) if now <= entry.expires_at => true,
            Some(_) => {
                inner.entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Remove an entry. Returns whether it was present (expired or not).
    pub fn delete(&self, key: &K) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.insertion_order.clear();
    }

    /// Number of stored entries. May overcount entries that have expired but
    /// have not been swept or touched yet.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry in one pass and return how many went.
    /// Also compacts the insertion-order queue.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| now <= entry.expires_at);
        let removed = before - inner.entries.len();

        let entries = &inner.entries;
        let live: Vec<K> = inner
            .insertion_order
            .iter()
            .filter(|k| entries.contains_key(*k))
            .cloned()
            .collect();
        inner.insertion_order = live.into();

        if removed > 0 {
            debug!(removed, remaining = inner.entries.len(), "Swept expired cache entries");
        }
        removed
    }

    /// Stop the background sweeper and clear all state. The cache must not
    /// be used afterwards; subsequent operations see an empty, inert store.
    pub fn destroy(&self) {
        let mut sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = sweeper.take() {
            handle.abort();
        }
        drop(sweeper);
        let mut inner = self.lock();
        inner.entries.clear();
        inner.insertion_order.clear();
        inner.destroyed = true;
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Spawn a periodic background sweep. The task holds only a weak
    /// reference, so dropping the cache stops it; `destroy` aborts it.
    pub fn start_sweep(self: &Arc<Self>, interval: Duration) {
        let weak: Weak<TtlCache<K, V>> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(cache) => {
                        cache.sweep();
                    }
                    None => break,
                }
            }
        });

        let mut sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = sweeper.replace(handle) {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_entries: usize) -> TtlCache<String, String> {
        TtlCache::new(max_entries, Duration::from_secs(60))
    }

    #[test]
    fn set_and_get() {
        let cache = cache(100);
        cache.set("key1".to_string(), "value1".to_string());
        assert_eq!(cache.get(&"key1".to_string()), Some("value1".to_string()));
    }

    #[test]
    fn get_missing() {
        let cache = cache(100);
        assert_eq!(cache.get(&"nope".to_string()), None);
    }

    #[test]
    fn ttl_expiration() {
        let cache = cache(100);
        cache.set_with_ttl(
            "key1".to_string(),
            "value1".to_string(),
            Duration::from_millis(10),
        );

        assert!(cache.has(&"key1".to_string()));

        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get(&"key1".to_string()), None);
        // The expired entry was deleted lazily by the failed read.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn has_deletes_expired_entries() {
        let cache = cache(100);
        cache.set_with_ttl("k".to_string(), "v".to_string(), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(20));

        assert!(!cache.has(&"k".to_string()));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn len_may_overcount_until_swept() {
        let cache = cache(100);
        cache.set_with_ttl("k".to_string(), "v".to_string(), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn fifo_eviction_drops_first_inserted() {
        let cache = cache(3);
        for i in 1..=4 {
            cache.set(format!("key{i}"), format!("value{i}"));
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&"key1".to_string()), None);
        for i in 2..=4 {
            assert!(cache.has(&format!("key{i}")), "key{i} should survive");
        }
    }

    #[test]
    fn overwrite_keeps_insertion_position() {
        let cache = cache(2);
        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());
        // Overwriting does not move "a" to the back of the queue.
        cache.set("a".to_string(), "3".to_string());
        cache.set("c".to_string(), "4".to_string());

        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some("2".to_string()));
        assert_eq!(cache.get(&"c".to_string()), Some("4".to_string()));
    }

    #[test]
    fn eviction_skips_deleted_keys() {
        let cache = cache(2);
        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());
        cache.delete(&"a".to_string());
        cache.set("c".to_string(), "3".to_string());
        // "a" was already gone, so inserting "d" must evict "b".
        cache.set("d".to_string(), "4".to_string());

        assert_eq!(cache.get(&"b".to_string()), None);
        assert!(cache.has(&"c".to_string()));
        assert!(cache.has(&"d".to_string()));
    }

    #[test]
    fn sweep_returns_removed_count() {
        let cache = cache(100);
        for i in 0..3 {
            cache.set_with_ttl(format!("short{i}"), "v".to_string(), Duration::from_millis(10));
        }
        cache.set("long".to_string(), "v".to_string());
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.sweep(), 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.has(&"long".to_string()));
    }

    #[test]
    fn clear_and_delete() {
        let cache = cache(100);
        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());

        assert!(cache.delete(&"a".to_string()));
        assert!(!cache.delete(&"a".to_string()));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn destroy_clears_and_disables() {
        let cache = cache(100);
        cache.set("a".to_string(), "1".to_string());
        cache.destroy();

        assert_eq!(cache.len(), 0);
        cache.set("b".to_string(), "2".to_string());
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[tokio::test]
    async fn background_sweep_removes_expired_entries() {
        let cache = Arc::new(TtlCache::<String, String>::new(
            100,
            Duration::from_millis(10),
        ));
        cache.set("k".to_string(), "v".to_string());
        cache.start_sweep(Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(80)).await;

        // Entry removed by the sweeper, not by access.
        assert_eq!(cache.len(), 0);
        cache.destroy();
    }
}
