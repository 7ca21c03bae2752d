//! Conditional cache - bounded, time-limited validator/payload store
//!
//! One instance is shared by every consumer in the process. All operations
//! are infallible; a miss is indistinguishable from an absent entry and
//! always falls through to a network fetch at the call site.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;

use crate::CacheKey;

/// Default entry capacity
pub const DEFAULT_CAPACITY: usize = 256;

/// Default maximum entry age
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct Entry {
    validator: String,
    payload: Value,
    stored_at: Instant,
    /// Recency tick, bumped on store and on payload reads.
    /// INVARIANT: eviction removes the entry with the smallest tick.
    last_used: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    tick: u64,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

/// Bounded, expiring store of (key -> validator token, payload) pairs
pub struct ConditionalCache {
    inner: Mutex<Inner>,
    capacity: usize,
    max_age: Duration,
}

impl ConditionalCache {
    /// Create a cache holding at most `capacity` entries, each readable for
    /// at most `max_age` after it was stored.
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        ConditionalCache {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            max_age,
        }
    }

    /// Stored validator token for a resource, if present and not expired.
    /// Does not refresh recency; only payload reads count as use.
    pub fn validator(&self, key: &CacheKey) -> Option<String> {
        let mut inner = self.inner.lock();
        if self.expire(&mut inner, key) {
            return None;
        }
        inner.entries.get(key).map(|e| e.validator.clone())
    }

    /// Cached payload for a resource, if present and not expired.
    /// Refreshes recency on hit.
    pub fn payload(&self, key: &CacheKey) -> Option<Value> {
        let mut inner = self.inner.lock();
        if self.expire(&mut inner, key) {
            return None;
        }
        let tick = inner.next_tick();
        let entry = inner.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.payload.clone())
    }

    /// Insert or overwrite an entry, stamping current time. A full cache
    /// evicts the single least-recently-used entry first.
    pub fn store(&self, key: CacheKey, validator: impl Into<String>, payload: Value) {
        let mut inner = self.inner.lock();
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            if let Some(victim) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                tracing::debug!(key = %victim, "evicting least-recently-used cache entry");
                inner.entries.remove(&victim);
            }
        }

        let tick = inner.next_tick();
        inner.entries.insert(
            key,
            Entry {
                validator: validator.into(),
                payload,
                stored_at: Instant::now(),
                last_used: tick,
            },
        );
    }

    /// Remove one exact entry.
    pub fn invalidate(&self, key: &CacheKey) {
        self.inner.lock().entries.remove(key);
    }

    /// Remove every entry whose key starts with the given prefix. Used
    /// after mutations to drop both the specific resource and any listing
    /// that might contain it.
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.has_prefix(prefix));
        let dropped = before - inner.entries.len();
        if dropped > 0 {
            tracing::debug!(prefix, dropped, "invalidated cache entries by prefix");
        }
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of physically present entries, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the entry if it is past `max_age`. Returns true when the
    /// entry was expired and removed.
    fn expire(&self, inner: &mut Inner, key: &CacheKey) -> bool {
        let expired = inner
            .entries
            .get(key)
            .is_some_and(|e| e.stored_at.elapsed() > self.max_age);
        if expired {
            inner.entries.remove(key);
        }
        expired
    }
}

impl Default for ConditionalCache {
    fn default() -> Self {
        ConditionalCache::new(DEFAULT_CAPACITY, DEFAULT_MAX_AGE)
    }
}
