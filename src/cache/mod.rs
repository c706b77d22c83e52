pub mod memory;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::core::{GameLogRow, QuerySignature};
use crate::error::Result;

pub use memory::MemoryCache;

/// Trait for game log cache implementations
pub trait StatsCache: Send + Sync {
    /// Fresh entry for `key`, or `None` when absent or expired
    fn get(&self, key: &QuerySignature) -> Result<Option<CacheEntry>>;

    /// Store `games` under `key`, replacing any previous entry
    fn put(&self, key: QuerySignature, games: Vec<GameLogRow>, ttl: Duration) -> Result<()>;

    /// Get cache statistics
    fn stats(&self) -> Result<CacheStats>;

    /// Drop expired entries, returning how many were removed
    fn cleanup(&self) -> Result<u64>;
}

/// Cached game log with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: QuerySignature,
    pub games: Arc<Vec<GameLogRow>>,
    /// Monotonic insertion time used for expiry
    pub created_at: Instant,
    /// Wall clock insertion time for reporting
    pub cached_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(key: QuerySignature, games: Vec<GameLogRow>, ttl: Duration) -> Self {
        Self {
            key,
            games: Arc::new(games),
            created_at: Instant::now(),
            cached_at: Utc::now(),
            ttl,
        }
    }

    /// Stale once `ttl` has fully elapsed
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub total_entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub evictions: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
