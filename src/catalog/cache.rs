//! TTL cache for fetched catalogs.
//!
//! Each key owns an async lock. The first caller for a stale or missing key
//! fetches while holding it; concurrent callers wait on the same lock and
//! then read the fresh entry, so at most one fetch per key is in flight.
//! Slots are never removed. Invalidation bumps a per-slot generation, and an
//! entry only counts as fresh while its generation is current.

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::Result;
use crate::selection::Candidate;

struct CachedCatalog {
    candidates: Arc<Vec<Candidate>>,
    fetched_at: Instant,
    generation: u64,
}

#[derive(Default)]
struct Slot {
    entry: Mutex<Option<CachedCatalog>>,
    generation: AtomicU64,
}

/// Per-key catalog cache with single-flight fetches.
pub struct CatalogCache {
    slots: DashMap<String, Arc<Slot>>,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached list for `key`, calling `fetch` when it is missing,
    /// older than the TTL, or invalidated.
    ///
    /// Errors from `fetch` are returned to the caller and never cached; a
    /// previously cached list stays in place.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Arc<Vec<Candidate>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Candidate>>>,
    {
        // Clone the slot out so no map shard lock is held across the await.
        let slot = Arc::clone(&*self.slots.entry(key.to_string()).or_default());
        let mut cached = slot.entry.lock().await;
        let generation = slot.generation.load(Ordering::Acquire);

        if let Some(entry) = cached.as_ref() {
            if entry.generation == generation && entry.fetched_at.elapsed() < self.ttl {
                tracing::debug!(key = %key, "Catalog cache hit");
                return Ok(Arc::clone(&entry.candidates));
            }
        }

        tracing::debug!(key = %key, "Catalog cache miss");
        let candidates = Arc::new(fetch().await?);
        *cached = Some(CachedCatalog {
            candidates: Arc::clone(&candidates),
            fetched_at: Instant::now(),
            generation,
        });
        Ok(candidates)
    }

    /// Mark the cached list for `key` stale.
    ///
    /// A fetch already in flight still completes, but its result is not
    /// served to later callers.
    pub fn invalidate(&self, key: &str) {
        if let Some(slot) = self.slots.get(key) {
            slot.generation.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Mark every cached list stale.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.generation.fetch_add(1, Ordering::AcqRel);
        }
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("keys", &self.slots.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
