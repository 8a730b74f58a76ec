//! Process-local response cache
//!
//! A bounded map with insertion-order eviction. Lookups never refresh an
//! entry's position; entries past their lifetime are dropped lazily when a
//! lookup finds them.

mod key;

pub use key::CacheKey;

use std::collections::{HashMap, VecDeque};

use chrono::{Duration, NaiveDateTime};
use parking_lot::Mutex;

use crate::core::config::CacheConfig;

struct Entry<V> {
    value: V,
    stored_at: NaiveDateTime,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys oldest-first by insertion
    order: VecDeque<String>,
}

/// Bounded, insertion-ordered cache guarded by a single lock
pub struct ResponseCache<V> {
    inner: Mutex<Inner<V>>,
    limit: usize,
    expiration: Duration,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(limit: usize, expiration: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(limit),
                order: VecDeque::with_capacity(limit),
            }),
            limit: limit.max(1),
            expiration,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.limit, config.expiration())
    }

    /// Return the cached value if it was stored less than `expiration` ago.
    /// A stale entry is removed.
    pub fn get(&self, key: &str, now: NaiveDateTime) -> Option<V> {
        let mut inner = self.inner.lock();
        let stored_at = inner.entries.get(key)?.stored_at;

        if now - stored_at < self.expiration {
            tracing::debug!(key, "Cache hit");
            return inner.entries.get(key).map(|e| e.value.clone());
        }

        tracing::debug!(key, "Cache entry expired");
        inner.entries.remove(key);
        inner.order.retain(|k| k != key);
        None
    }

    /// Store `value`, evicting the oldest-inserted entry when full
    pub fn put(&self, key: String, now: NaiveDateTime, value: V) {
        let mut inner = self.inner.lock();

        // Re-storing a key moves it to the back rather than duplicating it
        if inner.entries.remove(&key).is_some() {
            inner.order.retain(|k| k != &key);
        }

        while inner.order.len() >= self.limit {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            tracing::debug!(key = %oldest, "Cache evict");
        }

        tracing::debug!(key = %key, stored_at = %now, "Cache push");
        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }
}
