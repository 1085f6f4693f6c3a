//! Short-lived memo of the latest upstream price batch.
//!
//! Readers share the lock; `put` takes it exclusively. An expired entry is
//! reported as a miss and stays in place until the next `put` overwrites it.

use parking_lot::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::types::SnapshotBatch;

/// Default TTL for the upstream /latest payload
pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(60);

struct CachedBatch {
    batch: SnapshotBatch,
    stored_at: Instant,
}

pub struct SnapshotCache {
    entry: RwLock<Option<CachedBatch>>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `batch`, stamped with the current time.
    pub fn put(&self, batch: SnapshotBatch) {
        let mut entry = self.entry.write();
        *entry = Some(CachedBatch {
            batch,
            stored_at: Instant::now(),
        });
    }

    /// Copy of the cached batch, or `None` when empty or older than the TTL.
    pub fn get(&self) -> Option<SnapshotBatch> {
        let entry = self.entry.read();
        let cached = entry.as_ref()?;

        let age = cached.stored_at.elapsed();
        if age > self.ttl {
            debug!("Snapshot cache expired (age: {}ms)", age.as_millis());
            return None;
        }

        Some(cached.batch.clone())
    }

    /// Age of the stored batch, regardless of expiry
    pub fn age(&self) -> Option<Duration> {
        self.entry.read().as_ref().map(|c| c.stored_at.elapsed())
    }

    pub fn clear(&self) {
        *self.entry.write() = None;
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_TTL)
    }
}
