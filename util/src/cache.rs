//! Bounded, TTL-expiring read-through cache for profile and aggregate lookups.
//!
//! Keys are namespaced strings (`student:{id}`, `course:{id}`,
//! `dashboard:{id}`, `timetable:{id}`). Eviction is simple bounded-size:
//! once at capacity the oldest-inserted entry is dropped, not strict
//! recency-based. Expiry is checked lazily on read.
//!
//! Instances are constructed once at process start and passed by reference
//! through the application state; there are no process-wide cache globals.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<V> {
    map: HashMap<String, Entry<V>>,
    order: VecDeque<String>,
}

pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    max_size: usize,
    ttl: Duration,
}

/// Occupancy snapshot, surfaced by the cache-stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub usage: String,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_size,
            ttl,
        }
    }

    /// Returns the cached value, dropping it first if its TTL has lapsed.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let expired = match inner.map.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            inner.map.remove(key);
            return None;
        }
        inner.map.get(key).map(|e| e.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        if let Some(entry) = inner.map.get_mut(&key) {
            entry.value = value;
            entry.inserted_at = Instant::now();
            return;
        }

        // At capacity: walk the insertion queue until a live key is evicted.
        // The queue may hold keys already removed by invalidation.
        while inner.map.len() >= self.max_size {
            match inner.order.pop_front() {
                Some(oldest) => {
                    if inner.map.remove(&oldest).is_some() {
                        continue;
                    }
                }
                None => break,
            }
        }

        inner.map.insert(
            key.clone(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
        inner.order.push_back(key);
    }

    /// Removes every key containing the given substring; returns how many.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let doomed: Vec<String> = inner
            .map
            .keys()
            .filter(|k| k.contains(pattern))
            .cloned()
            .collect();
        for key in &doomed {
            inner.map.remove(key);
        }
        inner.order.retain(|k| !doomed.contains(k));
        doomed.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.map.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let size = self.len();
        CacheStats {
            size,
            max_size: self.max_size,
            usage: format!("{:.1}%", (size as f64 / self.max_size as f64) * 100.0),
        }
    }
}
