//! Wiring of feed, cache, store and scheduler into one runnable unit.

use anyhow::{Context, Result};
use flip_core::{
    CachedPriceFeed, IngestionScheduler, ItemQueryService, OsrsWikiClient, PriceFeed,
    SchedulerConfig, SchedulerHandle, SnapshotCache, StateStore,
};
use std::sync::Arc;
use tracing::info;

use crate::config::PriceUpdaterConfig;

pub struct PriceUpdater {
    store: Arc<StateStore>,
    scheduler: IngestionScheduler,
}

impl PriceUpdater {
    /// Build against the OSRS wiki, with the snapshot cache in front of it.
    pub fn new(config: &PriceUpdaterConfig) -> Result<Self> {
        let client = OsrsWikiClient::new(config.wiki_config())
            .context("Failed to initialize OSRS wiki client")?;
        let cache = Arc::new(SnapshotCache::new(config.snapshot_cache_ttl()));
        let feed: Arc<dyn PriceFeed> = Arc::new(CachedPriceFeed::new(client, cache));

        let store = Arc::new(StateStore::new(config.store_config()));

        info!(
            "Price updater configured (feed: {}, history cap: {:?})",
            feed.feed_name(),
            store.config().max_history_per_item
        );

        Ok(Self::with_feed(feed, store, config.scheduler_config()))
    }

    pub fn with_feed(
        feed: Arc<dyn PriceFeed>,
        store: Arc<StateStore>,
        scheduler_config: SchedulerConfig,
    ) -> Self {
        let scheduler = IngestionScheduler::new(feed, store.clone(), scheduler_config);
        Self { store, scheduler }
    }

    pub fn store(&self) -> Arc<StateStore> {
        self.store.clone()
    }

    /// Read-side handle sharing this updater's store
    pub fn query_service(&self) -> ItemQueryService {
        ItemQueryService::new(self.store.clone())
    }

    /// Run the startup cycle, then keep updating in the background.
    pub async fn start(self) -> SchedulerHandle {
        self.scheduler.start().await
    }
}
