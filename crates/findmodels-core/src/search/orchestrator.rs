//! Chunked, throttled search over missing models.

use super::backend::{LinkSearchBackend, SearchRequest};
use crate::cache::SearchCache;
use crate::config::{SearchConfig, SearchFlags};
use crate::models::{LinkResult, ModelCategory, ModelStatusRecord};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchUpdate {
    /// The request for this status key is about to be issued.
    Loading { key: String },
    /// Final links for this status key (possibly empty).
    Resolved {
        key: String,
        name: String,
        links: Vec<LinkResult>,
    },
}

impl SearchUpdate {
    pub fn key(&self) -> &str {
        match self {
            SearchUpdate::Loading { key } | SearchUpdate::Resolved { key, .. } => key,
        }
    }
}

/// Split `len` items into consecutive chunks of `concurrency` items.
pub fn plan_chunks(len: usize, concurrency: usize) -> Vec<Range<usize>> {
    let size = concurrency.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Issues cache-through searches in bounded concurrent chunks.
#[derive(Clone)]
pub struct SearchOrchestrator {
    backend: Arc<dyn LinkSearchBackend>,
    cache: SearchCache,
    flags: SearchFlags,
    chunk_delay: Duration,
}

impl SearchOrchestrator {
    pub fn new(backend: Arc<dyn LinkSearchBackend>, cache: SearchCache) -> Self {
        Self {
            backend,
            cache,
            flags: SearchFlags::default(),
            chunk_delay: SearchConfig::CHUNK_DELAY,
        }
    }

    pub fn with_flags(mut self, flags: SearchFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Links for a single model, read through the cache unless bypassed.
    ///
    /// Successful searches are written back, empty ones included. Failures
    /// yield an empty list and are not cached.
    pub async fn search_one(
        &self,
        name: &str,
        category: ModelCategory,
        bypass_cache: bool,
    ) -> Vec<LinkResult> {
        if !bypass_cache {
            if let Some(links) = self.cache.get(name) {
                return links;
            }
        }

        let request = SearchRequest::new(name, category, self.flags);
        match self.backend.search(&request).await {
            Ok(links) => {
                self.cache.set(name, &links);
                links
            }
            Err(e) => {
                warn!(model = name, category = %category, error = %e, "Model search failed");
                Vec::new()
            }
        }
    }

    /// Search every record, `concurrency` at a time.
    ///
    /// Each chunk is announced with `Loading` updates before its requests
    /// start; each request reports `Resolved` as soon as it completes. The
    /// next chunk starts only after the whole chunk has finished and the
    /// inter-chunk delay has elapsed.
    pub async fn search_missing<F>(
        &self,
        records: &[ModelStatusRecord],
        concurrency: usize,
        bypass_cache: bool,
        mut on_update: F,
    ) -> BTreeMap<String, Vec<LinkResult>>
    where
        F: FnMut(SearchUpdate),
    {
        let chunks = plan_chunks(records.len(), concurrency);
        let mut results = BTreeMap::new();

        for (index, range) in chunks.iter().enumerate() {
            let chunk = &records[range.clone()];
            debug!(chunk = index + 1, of = chunks.len(), size = chunk.len(), "Searching chunk");

            for record in chunk {
                on_update(SearchUpdate::Loading { key: record.key() });
            }

            let mut pending: FuturesUnordered<_> = chunk
                .iter()
                .map(|record| async move {
                    let links = self
                        .search_one(&record.name, record.category, bypass_cache)
                        .await;
                    (record, links)
                })
                .collect();

            while let Some((record, links)) = pending.next().await {
                let key = record.key();
                on_update(SearchUpdate::Resolved {
                    key: key.clone(),
                    name: record.name.clone(),
                    links: links.clone(),
                });
                results.insert(key, links);
            }

            if index + 1 < chunks.len() && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }

        results
    }
}
