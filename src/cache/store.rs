//! TTL Cache Store Module
//!
//! Keyed store with absolute per-entry expiry, lazy eviction on read and
//! explicit invalidation by key, key prefix, or wholesale.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, LruTracker, SystemClock};

// == TTL Cache ==
/// Expiring key-value cache.
///
/// An entry in `entries` is either fresh or gets removed the next time its key
/// is read. Nothing here fails: a missing or expired key is just `None`.
///
/// `generation` moves forward on every invalidation, so a read-through caller
/// can tell whether its fetch raced one (see [`TtlCache::set_if_generation`]).
#[derive(Debug)]
pub struct TtlCache<T> {
    /// Name used in logs and stats output
    name: &'static str,
    entries: HashMap<String, CacheEntry<T>>,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
    /// Present only when the cache is bounded
    lru: Option<LruTracker>,
    max_entries: Option<usize>,
    generation: u64,
}

impl<T: Clone> TtlCache<T> {
    // == Constructors ==
    /// Creates an unbounded cache on the system clock.
    pub fn new(name: &'static str) -> Self {
        Self::with_clock(name, Arc::new(SystemClock))
    }

    /// Creates an unbounded cache reading time from `clock`.
    pub fn with_clock(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            clock,
            stats: CacheStats::new(),
            lru: None,
            max_entries: None,
            generation: 0,
        }
    }

    /// Bounds the cache to `max_entries`, evicting the least recently used key
    /// when a new key would exceed it. A limit of 0 leaves the cache unbounded.
    pub fn with_capacity_limit(mut self, max_entries: usize) -> Self {
        if max_entries == 0 {
            self.lru = None;
            self.max_entries = None;
        } else {
            let mut lru = LruTracker::new();
            for key in self.entries.keys() {
                lru.touch(key);
            }
            self.lru = Some(lru);
            self.max_entries = Some(max_entries);
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    // == Get ==
    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry is removed on the spot.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                debug!(cache = self.name, "cache miss");
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            debug!(cache = self.name, "cache entry expired on read");
            return None;
        }

        self.stats.record_hit();
        if let Some(lru) = self.lru.as_mut() {
            lru.touch(key);
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: T, ttl: Duration) {
        let key = key.into();
        let now = self.clock.now_ms();

        if !self.entries.contains_key(&key) {
            self.make_room();
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, now, ttl));
        if let Some(lru) = self.lru.as_mut() {
            lru.touch(&key);
        }
        self.stats.set_total_entries(self.entries.len());
    }

    /// Current invalidation generation. Read it together with the miss that
    /// starts a fetch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stores `value` only if no invalidation happened since `generation` was
    /// read. Returns whether the value was stored.
    pub fn set_if_generation(
        &mut self,
        key: impl Into<String>,
        generation: u64,
        value: T,
        ttl: Duration,
    ) -> bool {
        if self.generation != generation {
            debug!(cache = self.name, "dropping fetch that raced an invalidation");
            return false;
        }
        self.set(key, value, ttl);
        true
    }

    // == Invalidate ==
    /// Removes the entry for `key`. Returns whether one was present.
    ///
    /// Advances the generation even when nothing was stored, since a fetch
    /// for `key` may be in flight.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.generation += 1;
        let removed = self.remove_entry(key);
        if removed {
            self.stats.record_invalidations(1);
        }
        removed
    }

    // == Invalidate By Prefix ==
    /// Removes every entry whose key starts with `prefix`. Returns the count.
    pub fn invalidate_by_prefix(&mut self, prefix: &str) -> usize {
        self.generation += 1;
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &doomed {
            self.remove_entry(key);
        }
        self.stats.record_invalidations(doomed.len());
        doomed.len()
    }

    // == Clear ==
    /// Removes all entries. Returns how many there were.
    pub fn clear(&mut self) -> usize {
        self.generation += 1;
        let count = self.entries.len();
        self.entries.clear();
        if let Some(lru) = self.lru.as_mut() {
            lru.clear();
        }
        self.stats.record_invalidations(count);
        self.stats.set_total_entries(0);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        self.stats.record_expirations(expired.len());
        expired.len()
    }

    // == Introspection ==
    /// Whether an entry for `key` is physically stored, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries, including ones not yet observed as expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            if let Some(lru) = self.lru.as_mut() {
                lru.remove(key);
            }
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    /// Evicts least recently used entries until a new key fits.
    fn make_room(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };
        while self.entries.len() >= max {
            let Some(victim) = self.lru.as_mut().and_then(LruTracker::evict_oldest) else {
                break;
            };
            self.entries.remove(&victim);
            self.stats.record_eviction();
            debug!(cache = self.name, "evicted least recently used entry");
        }
    }
}
