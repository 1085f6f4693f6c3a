//! Price feed decorator that memoizes `fetch_latest` in a `SnapshotCache`.
//!
//! Concurrent misses are funnelled through a single upstream call: the first
//! caller fetches, the rest wait on the fetch lock and then read the cache.
//! Name lookups pass straight through.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::price_feed::PriceFeed;
use crate::cache::SnapshotCache;
use crate::types::{NameMapping, SnapshotBatch};

pub struct CachedPriceFeed<F> {
    inner: F,
    cache: Arc<SnapshotCache>,
    fetch_lock: Mutex<()>,
    name: String,
}

impl<F: PriceFeed> CachedPriceFeed<F> {
    pub fn new(inner: F, cache: Arc<SnapshotCache>) -> Self {
        let name = format!("Cached({})", inner.feed_name());
        Self {
            inner,
            cache,
            fetch_lock: Mutex::new(()),
            name,
        }
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }
}

#[async_trait]
impl<F: PriceFeed> PriceFeed for CachedPriceFeed<F> {
    fn feed_name(&self) -> &str {
        &self.name
    }

    async fn fetch_latest(&self) -> Result<SnapshotBatch> {
        if let Some(batch) = self.cache.get() {
            debug!("Snapshot cache hit ({} items)", batch.len());
            return Ok(batch);
        }

        let _guard = self.fetch_lock.lock().await;

        // Another caller may have filled the cache while we waited
        if let Some(batch) = self.cache.get() {
            debug!("Snapshot cache filled while waiting ({} items)", batch.len());
            return Ok(batch);
        }

        debug!("Snapshot cache miss, fetching from {}", self.inner.feed_name());
        let batch = self.inner.fetch_latest().await?;
        self.cache.put(batch.clone());
        Ok(batch)
    }

    async fn fetch_names(&self) -> Result<NameMapping> {
        self.inner.fetch_names().await
    }
}
