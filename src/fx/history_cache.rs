use chrono::NaiveDate;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::constants::{HISTORY_CACHE_CAPACITY, HISTORY_CACHE_TTL};

/// Build the cache key for a range lookup. The key carries the range and
/// the pagination window only; the base currency is fixed.
pub fn history_key(start: NaiveDate, end: NaiveDate, page: i64, size: i64) -> String {
    format!("{}:{}:{}:{}", start, end, page, size)
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded TTL cache for assembled range responses. Entries expire after
/// the TTL; at capacity the oldest entry is evicted.
pub struct HistoryCache<V: Clone> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> HistoryCache<V> {
    pub fn new() -> Self {
        Self::with_limits(HISTORY_CACHE_TTL, HISTORY_CACHE_CAPACITY)
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        HistoryCache {
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.inserted_at.elapsed() < self.ttl {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn put(&self, key: String, value: V) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_one();
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    fn evict_one(&self) {
        // Prefer dropping an expired entry; otherwise drop the oldest.
        let victim = self
            .entries
            .iter()
            .filter(|entry| entry.inserted_at.elapsed() >= self.ttl)
            .map(|entry| entry.key().clone())
            .next()
            .or_else(|| {
                self.entries
                    .iter()
                    .min_by_key(|entry| entry.inserted_at)
                    .map(|entry| entry.key().clone())
            });

        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<V: Clone> Default for HistoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
