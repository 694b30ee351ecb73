//! Bounded in-memory response cache
//!
//! Keeps at most `capacity` entries. Inserting a new key into a full cache
//! evicts exactly one existing entry: the first key the map yields, which is
//! arbitrary. Replacing an existing key never evicts.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries dropped to make room
    pub evictions: u64,
    /// Current number of entries
    pub entries: usize,
    /// Maximum number of entries
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Key → value cache with a hard entry bound
///
/// Values are handed out by clone, so `V` is normally a shared handle such as
/// `Arc<T>`. Dropping an entry (eviction, [`clear`](Self::clear) or dropping
/// the cache) releases the cache's handle.
pub struct ResponseCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    capacity: NonZeroUsize,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V> std::fmt::Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.entries.lock().len())
            .field("capacity", &self.capacity)
            .field("enabled", &self.enabled)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl<V: Clone> ResponseCache<V> {
    /// Create an enabled cache holding at most `capacity` entries
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::build(capacity, true)
    }

    /// Create a cache that never stores anything
    #[must_use]
    pub fn disabled() -> Self {
        Self::build(NonZeroUsize::MIN, false)
    }

    fn build(capacity: NonZeroUsize, enabled: bool) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity(if enabled { capacity.get() } else { 0 })),
            capacity,
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let found = self.entries.lock().get(key).map(|entry| entry.value.clone());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key_len = key.len(), "Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key_len = key.len(), "Cache miss");
        }
        found
    }

    /// Store a value
    ///
    /// Returns the key of the entry evicted to make room, if any.
    pub fn put(&self, key: impl Into<String>, value: V) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = key.into();
        let mut entries = self.entries.lock();

        let evicted = if !entries.contains_key(&key) && entries.len() >= self.capacity.get() {
            let victim = entries.keys().next().cloned();
            if let Some(victim) = &victim {
                if let Some(old) = entries.remove(victim) {
                    debug!(
                        age_ms = u64::try_from(old.inserted_at.elapsed().as_millis())
                            .unwrap_or(u64::MAX),
                        "Evicted cache entry"
                    );
                }
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
            victim
        } else {
            None
        };

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
        evicted
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        if count > 0 {
            debug!(count, "Cache cleared");
        }
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries
    pub const fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Whether the cache stores values at all
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
            capacity: self.capacity.get(),
        }
    }
}
