//! Flip Core - Grand Exchange price ingestion and item state.
//!
//! This module provides:
//! - Upstream price feed abstraction with an OSRS Wiki implementation
//! - TTL snapshot cache with single-flight upstream fetches
//! - Trend, margin and tax calculations
//! - Merge engine reconciling snapshot batches with known item state
//! - Concurrent in-memory state store with bounded price history
//! - Periodic ingestion scheduler with per-cycle timeout and graceful stop
//! - Validated read-side queries (lookup, search, history)

pub mod cache;
pub mod clients;
pub mod error;
pub mod merge;
pub mod pagination;
pub mod pricing;
pub mod query;
pub mod scheduler;
pub mod store;
mod types;

pub use cache::SnapshotCache;
pub use clients::{CachedPriceFeed, OsrsWikiClient, OsrsWikiConfig, PriceFeed};
pub use error::{QueryError, QueryResult};
pub use merge::{MergeEngine, MergeReport};
pub use pagination::{PaginatedResult, PaginationParams};
pub use pricing::FlipMetrics;
pub use query::ItemQueryService;
pub use scheduler::{CycleReport, IngestionScheduler, SchedulerConfig, SchedulerHandle};
pub use store::{StateStore, StoreConfig};
pub use types::*;
