//! Upstream Price Feed Trait
//!
//! Common interface for sources of item price snapshots and item names.
//! Both reads are idempotent; a failed name fetch must never block prices.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{NameMapping, SnapshotBatch};

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Name used in log lines
    fn feed_name(&self) -> &str;

    /// Latest high/low quotes for every item the source knows about
    async fn fetch_latest(&self) -> Result<SnapshotBatch>;

    /// Item id -> display name
    async fn fetch_names(&self) -> Result<NameMapping>;
}
