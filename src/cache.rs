//! Process-local cache of permission check results.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::types::CacheKey;

/// A bounded, time-expiring cache of check results.
///
/// Entries expire a fixed `ttl` after insertion; reading an entry does not
/// extend its lifetime but does make it the most recently used. Once more
/// than `capacity` entries are held, the least recently used one is evicted.
/// A capacity of zero disables caching.
///
/// Lookups, inserts and removals are constant time. Expired entries are
/// dropped when read, when evicted as least recently used, or by
/// [`purge_expired`](PermissionCache::purge_expired).
///
/// `PermissionCache` is cheap to clone; clones share the same entries.
#[derive(Debug, Clone)]
pub struct PermissionCache {
    inner: Arc<Mutex<CacheState>>,
    capacity: usize,
    ttl: Duration,
}

/// Opaque marker of the cache's invalidation history.
///
/// Taken before a check goes to the network and handed back to
/// [`PermissionCache::insert_if_current`], so a result that raced with an
/// invalidation is dropped instead of stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Debug)]
struct CacheState {
    entries: LruCache<CacheKey, CacheEntry>,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    allowed: bool,
    inserted_at: Instant,
}

impl PermissionCache {
    /// Creates a cache holding at most `capacity` entries for `ttl` each.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        // A zero capacity never reaches the LRU; every operation short-circuits.
        let bound = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(bound),
                generation: 0,
            })),
            capacity,
            ttl,
        }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached result for `key`, if present and unexpired.
    pub fn get(&self, key: &CacheKey) -> Option<bool> {
        if self.capacity == 0 {
            return None;
        }

        let now = Instant::now();
        let mut state = self.state();

        let entry = *state.entries.get(key)?;
        if self.is_expired(&entry, now) {
            state.entries.pop(key);
            return None;
        }
        Some(entry.allowed)
    }

    /// Stores a result, replacing any previous entry and restarting its TTL.
    pub fn insert(&self, key: CacheKey, allowed: bool) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state();
        self.insert_locked(&mut state, key, allowed);
    }

    /// Returns the current invalidation generation.
    pub fn generation(&self) -> Generation {
        Generation(self.state().generation)
    }

    /// Stores a result only if nothing was invalidated since `generation` was
    /// taken. Returns whether the entry was stored.
    pub fn insert_if_current(
        &self,
        key: CacheKey,
        allowed: bool,
        generation: Generation,
    ) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let mut state = self.state();
        if state.generation != generation.0 {
            return false;
        }
        self.insert_locked(&mut state, key, allowed);
        true
    }

    /// Removes the entry for `key`. Returns whether one was present.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let mut state = self.state();
        state.generation = state.generation.wrapping_add(1);
        state.entries.pop(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut state = self.state();
        state.generation = state.generation.wrapping_add(1);
        state.entries.clear();
    }

    /// Drops all expired entries. Walks the whole cache.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let mut state = self.state();
        let expired: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.entries.pop(key);
        }
    }

    /// Returns the number of entries held, including any not yet purged
    /// after expiring.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Returns `true` if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        // Every critical section leaves the state consistent, so a panic
        // elsewhere while holding the lock does not invalidate it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_locked(&self, state: &mut CacheState, key: CacheKey, allowed: bool) {
        state.entries.put(
            key,
            CacheEntry {
                allowed,
                inserted_at: Instant::now(),
            },
        );
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.ttl
    }
}
