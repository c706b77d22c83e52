use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats, StatsCache};
use crate::core::{GameLogRow, QuerySignature};
use crate::error::{Result, StatsEngineError};

#[derive(Default)]
struct Inner {
    entries: HashMap<QuerySignature, CacheEntry>,
    hits: u64,
    misses: u64,
    expirations: u64,
    evictions: u64,
}

impl Inner {
    fn purge_expired(&mut self, now: Instant) -> u64 {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = (before - self.entries.len()) as u64;
        self.expirations += removed;
        removed
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .values()
            .min_by_key(|entry| entry.created_at)
            .map(|entry| entry.key.clone());

        if let Some(key) = oldest {
            tracing::debug!("Evicting oldest cache entry {}", key);
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }
}

/// In-memory TTL cache bounded by entry count.
///
/// One mutex guards every read-modify-write. Expiry is checked lazily on
/// read; when full, expired entries go first, then the oldest entry.
pub struct MemoryCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StatsEngineError::Cache("cache lock poisoned".to_string()))
    }
}

impl StatsCache for MemoryCache {
    fn get(&self, key: &QuerySignature) -> Result<Option<CacheEntry>> {
        let mut inner = self.lock()?;
        let now = Instant::now();

        let state = inner.entries.get(key).map(|entry| entry.is_expired_at(now));
        match state {
            Some(false) => {
                inner.hits += 1;
                Ok(inner.entries.get(key).cloned())
            }
            Some(true) => {
                inner.entries.remove(key);
                inner.expirations += 1;
                inner.misses += 1;
                tracing::debug!("Cache entry {} expired", key);
                Ok(None)
            }
            None => {
                inner.misses += 1;
                Ok(None)
            }
        }
    }

    fn put(&self, key: QuerySignature, games: Vec<GameLogRow>, ttl: Duration) -> Result<()> {
        let mut inner = self.lock()?;

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            inner.purge_expired(Instant::now());
            if inner.entries.len() >= self.capacity {
                inner.evict_oldest();
            }
        }

        inner
            .entries
            .insert(key.clone(), CacheEntry::new(key, games, ttl));
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats> {
        let inner = self.lock()?;

        Ok(CacheStats {
            total_entries: inner.entries.len() as u64,
            hits: inner.hits,
            misses: inner.misses,
            expirations: inner.expirations,
            evictions: inner.evictions,
            oldest_entry: inner.entries.values().map(|e| e.cached_at).min(),
            newest_entry: inner.entries.values().map(|e| e.cached_at).max(),
        })
    }

    fn cleanup(&self) -> Result<u64> {
        let mut inner = self.lock()?;
        Ok(inner.purge_expired(Instant::now()))
    }
}
