//! Reconciles an ingested snapshot batch with existing item state.
//!
//! Per item:
//! - Representative price is `high`, falling back to `low`; both zero drops the item
//! - Known items keep name and averages, and get a trend against their 24h average
//! - New items take the mapped name (or `Item <id>`) and seed both averages
//! - A history point is appended before the new state is written

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::pricing;
use crate::store::StateStore;
use crate::types::{ItemId, ItemState, NameMapping, PriceSnapshot, SnapshotBatch, Trend};

/// Outcome of merging one batch
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// States written to the store, ascending by id
    pub accepted: Vec<ItemState>,
    /// Items seen for the first time
    pub created: usize,
    /// Items skipped because neither quote was usable
    pub dropped: usize,
}

pub struct MergeEngine {
    store: Arc<StateStore>,
}

impl MergeEngine {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    /// Merge `batch` into the store.
    ///
    /// `fetched_at` is the logical observation time shared by every history
    /// point of the batch. The whole batch is applied under one exclusive
    /// store lock, so no reader sees a lookup/write interleaving from another
    /// writer.
    pub fn merge_batch(
        &self,
        batch: &SnapshotBatch,
        names: &NameMapping,
        fetched_at: DateTime<Utc>,
    ) -> MergeReport {
        let mut ids: Vec<ItemId> = batch.keys().copied().collect();
        ids.sort_unstable();

        self.store.update_with(|txn| {
            let mut report = MergeReport::default();

            for id in ids {
                let snapshot = &batch[&id];
                let existing = txn.get(id);
                let is_new = existing.is_none();

                let Some(state) = merge_item(existing, id, snapshot, names, fetched_at) else {
                    debug!("Dropping item {} with no usable price", id);
                    report.dropped += 1;
                    continue;
                };

                txn.append_history(id, state.price, fetched_at);
                txn.upsert(state.clone());

                if is_new {
                    report.created += 1;
                }
                report.accepted.push(state);
            }

            report
        })
    }
}

/// Build the next state for one item, or `None` when the snapshot has no price.
pub fn merge_item(
    existing: Option<&ItemState>,
    id: ItemId,
    snapshot: &PriceSnapshot,
    names: &NameMapping,
    fetched_at: DateTime<Utc>,
) -> Option<ItemState> {
    let price = snapshot.representative_price()?;

    let (name, avg_24h, avg_7d, trend) = match existing {
        Some(prev) => (
            prev.name.clone(),
            prev.avg_24h,
            prev.avg_7d,
            pricing::trend(price, prev.avg_24h),
        ),
        None => (placeholder_name(id, names), price, price, Trend::Flat),
    };

    Some(ItemState {
        item_id: id,
        name,
        price,
        high: snapshot.high,
        low: snapshot.low,
        volume: snapshot.volume.unwrap_or(0),
        avg_24h,
        avg_7d,
        trend,
        updated_at: fetched_at,
    })
}

fn placeholder_name(id: ItemId, names: &NameMapping) -> String {
    match names.get(&id) {
        Some(name) if !name.is_empty() => name.clone(),
        _ => format!("Item {}", id),
    }
}
