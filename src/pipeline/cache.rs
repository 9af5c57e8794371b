//! Time-bounded page cache for the story listing
//!
//! Entries live for a fixed TTL from the moment they are written. Nothing
//! invalidates them when an ingestion cycle lands new stories, so a cached
//! page can lag storage by at most one TTL.
//!
//! Every write sweeps expired entries, and the map never holds more than
//! `capacity` pages: a write into a full cache evicts the entry closest to
//! expiry.

use super::types::{PageRequest, Story};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    stories: Vec<Story>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Read-through cache keyed by exact (page, limit)
pub struct PageCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<PageRequest, CacheEntry>>,
}

impl PageCache {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, Self::DEFAULT_CAPACITY)
    }

    /// Cache holding at most `capacity` pages (minimum 1)
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached page, or `None` when absent or expired
    ///
    /// An expired entry is dropped on the way out.
    pub fn get(&self, key: &PageRequest) -> Option<Vec<Story>> {
        let mut entries = self.entries.lock().ok()?;
        let now = Instant::now();

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.stories.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
        }
        None
    }

    /// Store a page; it expires `ttl` after this call
    ///
    /// Expired entries are swept first. If the cache is still full, the
    /// entry that would expire soonest is evicted to make room.
    pub fn set(&self, key: PageRequest, stories: Vec<Story>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| *k);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                log::debug!(
                    "Page cache full, evicted page {} limit {}",
                    oldest.page,
                    oldest.limit
                );
            }
        }

        entries.insert(
            key,
            CacheEntry {
                stories,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
