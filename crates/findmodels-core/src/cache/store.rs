//! Search-result cache with a time-to-live.
//!
//! Entries are stored as JSON `{ "timestamp": <epoch ms>, "results": [...] }`
//! under `CacheConfig::KEY_PREFIX + lowercase(trim(name))`. The cache never
//! fails loudly: storage errors degrade to misses, and a full store triggers
//! a bounded background sweep of expired entries.

use super::traits::KeyValueStore;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::models::LinkResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CachePayload {
    timestamp: i64,
    results: Vec<LinkResult>,
}

/// Outcome of one sweep batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepBatch {
    pub examined: usize,
    pub removed: usize,
    /// Last key examined when more keys remain.
    pub next_cursor: Option<String>,
}

/// Cache of search results keyed by model name.
#[derive(Clone)]
pub struct SearchCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    batch_size: usize,
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("ttl", &self.ttl)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

/// Storage key for a model name.
pub fn cache_key(model_name: &str) -> String {
    format!(
        "{}{}",
        CacheConfig::KEY_PREFIX,
        model_name.trim().to_lowercase()
    )
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl SearchCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ttl: CacheConfig::TTL,
            batch_size: CacheConfig::SWEEP_BATCH_SIZE,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, timestamp: i64, now: i64) -> bool {
        now.saturating_sub(timestamp) > self.ttl.as_millis() as i64
    }

    /// Cached results for a model name, if present and fresh.
    ///
    /// An empty list is a valid hit. Corrupt payloads are removed
    /// immediately; expired ones are removed off the calling path.
    pub fn get(&self, model_name: &str) -> Option<Vec<LinkResult>> {
        let key = cache_key(model_name);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                return None;
            }
        };

        let payload: CachePayload = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Removing corrupt cache entry");
                self.remove_quietly(&key);
                return None;
            }
        };

        if self.is_expired(payload.timestamp, now_millis()) {
            debug!(key = %key, "Cache entry expired");
            self.remove_deferred(key);
            return None;
        }

        debug!(key = %key, results = payload.results.len(), "Cache hit");
        Some(payload.results)
    }

    /// Store results for a model name, stamped with the current time.
    ///
    /// A quota failure drops this write and schedules a sweep; the next
    /// write may then succeed.
    pub fn set(&self, model_name: &str, results: &[LinkResult]) {
        let key = cache_key(model_name);
        let payload = CachePayload {
            timestamp: now_millis(),
            results: results.to_vec(),
        };
        let raw = match serde_json::to_string(&payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        match self.store.set(&key, &raw) {
            Ok(()) => debug!(key = %key, results = results.len(), "Cached search results"),
            Err(e) if e.is_quota_exceeded() => {
                warn!(key = %key, "Cache storage full, sweeping expired entries");
                self.sweep();
            }
            Err(e) => warn!(key = %key, error = %e, "Cache write failed"),
        }
    }

    /// Drop the entry for a model name.
    pub fn invalidate(&self, model_name: &str) {
        self.remove_quietly(&cache_key(model_name));
    }

    /// Remove every entry under the cache namespace. Returns the count removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        loop {
            let keys = self
                .store
                .keys_after(CacheConfig::KEY_PREFIX, None, self.batch_size)?;
            if keys.is_empty() {
                break;
            }
            for key in keys {
                if self.store.remove(&key)? {
                    removed += 1;
                }
            }
        }
        debug!(removed, "Cleared search cache");
        Ok(removed)
    }

    /// Examine up to one batch of keys after `cursor`, removing expired and
    /// corrupt entries.
    pub fn sweep_batch(&self, cursor: Option<&str>) -> Result<SweepBatch> {
        let mut keys =
            self.store
                .keys_after(CacheConfig::KEY_PREFIX, cursor, self.batch_size + 1)?;
        let has_more = keys.len() > self.batch_size;
        keys.truncate(self.batch_size);

        let now = now_millis();
        let mut batch = SweepBatch {
            examined: keys.len(),
            ..SweepBatch::default()
        };

        for key in &keys {
            let stale = match self.store.get(key)? {
                Some(raw) => match serde_json::from_str::<CachePayload>(&raw) {
                    Ok(payload) => self.is_expired(payload.timestamp, now),
                    Err(_) => true,
                },
                None => false,
            };
            if stale && self.store.remove(key)? {
                batch.removed += 1;
            }
        }

        if has_more {
            batch.next_cursor = keys.last().cloned();
        }
        Ok(batch)
    }

    /// Sweep the whole namespace batch by batch, yielding between batches.
    pub async fn sweep_all(&self) -> usize {
        let mut cursor: Option<String> = None;
        let mut removed = 0;
        loop {
            let batch = match self.sweep_batch(cursor.as_deref()) {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(error = %e, "Cache sweep aborted");
                    break;
                }
            };
            removed += batch.removed;
            match batch.next_cursor {
                Some(next) => {
                    cursor = Some(next);
                    tokio::task::yield_now().await;
                    tokio::time::sleep(CacheConfig::SWEEP_RESCHEDULE_DELAY).await;
                }
                None => break,
            }
        }
        debug!(removed, "Cache sweep finished");
        removed
    }

    /// Start a background sweep. Returns `None` outside a tokio runtime.
    pub fn sweep(&self) -> Option<JoinHandle<usize>> {
        let handle = Handle::try_current().ok()?;
        let cache = self.clone();
        Some(handle.spawn(async move { cache.sweep_all().await }))
    }

    fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(key = %key, error = %e, "Failed to remove cache entry");
        }
    }

    /// Remove an entry only if it is still expired or corrupt, so a fresh
    /// write that lands first survives.
    fn remove_if_stale(&self, key: &str) {
        let stale = match self.store.get(key) {
            Ok(Some(raw)) => serde_json::from_str::<CachePayload>(&raw)
                .map(|payload| self.is_expired(payload.timestamp, now_millis()))
                .unwrap_or(true),
            Ok(None) => false,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                false
            }
        };
        if stale {
            self.remove_quietly(key);
        }
    }

    fn remove_deferred(&self, key: String) {
        match Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                handle.spawn(async move { cache.remove_if_stale(&key) });
            }
            Err(_) => self.remove_if_stale(&key),
        }
    }
}
