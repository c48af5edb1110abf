//! Short-term response caching with per-entry TTL
//!
//! Each data class gets its own TTL (balance ~30s, supply ~60s, fee
//! estimate ~10s) because staleness tolerance differs. A read past expiry
//! behaves as a miss and evicts the entry; a periodic sweep removes expired
//! entries proactively.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Generic key -> value store with absolute expiry per entry
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ResponseCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop a single entry (e.g. a wallet balance after a verified burn)
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove all expired entries; returns how many were dropped
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }
}

impl<V: Clone> ResponseCache<V> {
    /// Returns the value, or None if absent or expired. Expired entries
    /// are evicted on read.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        // Guard ref dropped above; safe to remove the stale entry now
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

impl<V: Send + Sync + 'static> ResponseCache<V> {
    /// Spawn the periodic sweep task
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let dropped = cache.sweep();
                if dropped > 0 {
                    debug!(dropped, remaining = cache.len(), "Cache sweep");
                }
            }
        })
    }
}
