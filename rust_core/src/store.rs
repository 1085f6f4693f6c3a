//! Authoritative in-memory item state and price history.
//!
//! This module provides:
//! - Point lookup, search and paginated listing over current item state
//! - Per-item append-only price history, kept ordered by observation date
//! - `update_with` for read-modify-write sequences under one exclusive lock
//!
//! Every mutating call holds the write lock for the whole store; every read
//! holds the read lock. Items live in a `BTreeMap` so listings come out in
//! ascending id order, which keeps pagination stable between identical queries.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::pagination::{PaginatedResult, PaginationParams};
use crate::types::{HistoryPoint, ItemId, ItemState};

/// 30 days of points at the default 5 minute ingestion interval
pub const DEFAULT_MAX_HISTORY_PER_ITEM: usize = 8_640;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Per-item history cap; the oldest observation is evicted past it.
    /// `None` keeps history forever.
    pub max_history_per_item: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_history_per_item: Some(DEFAULT_MAX_HISTORY_PER_ITEM),
        }
    }
}

impl StoreConfig {
    pub fn unbounded() -> Self {
        Self {
            max_history_per_item: None,
        }
    }
}

#[derive(Default)]
struct StoreInner {
    items: BTreeMap<ItemId, ItemState>,
    /// Sorted ascending by `date`; equal dates keep insertion order
    history: HashMap<ItemId, VecDeque<HistoryPoint>>,
}

impl StoreInner {
    fn upsert(&mut self, item: ItemState) {
        self.items.insert(item.item_id, item);
    }

    fn append_history(&mut self, point: HistoryPoint, cap: Option<usize>) {
        let points = self.history.entry(point.item_id).or_default();

        let pos = points.partition_point(|p| p.date <= point.date);
        points.insert(pos, point);

        if let Some(cap) = cap {
            while points.len() > cap {
                points.pop_front();
            }
        }
    }
}

/// Exclusive view of the store handed to `StateStore::update_with`
pub struct StoreTxn<'a> {
    inner: &'a mut StoreInner,
    max_history: Option<usize>,
}

impl StoreTxn<'_> {
    pub fn get(&self, id: ItemId) -> Option<&ItemState> {
        self.inner.items.get(&id)
    }

    pub fn upsert(&mut self, item: ItemState) {
        self.inner.upsert(item);
    }

    pub fn append_history(&mut self, id: ItemId, price: i64, date: DateTime<Utc>) {
        self.inner.append_history(new_point(id, price, date), self.max_history);
    }
}

pub struct StateStore {
    inner: RwLock<StoreInner>,
    config: StoreConfig,
}

impl StateStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Replace (or create) each item wholesale. Atomic per item.
    pub fn upsert(&self, items: Vec<ItemState>) {
        let mut inner = self.inner.write();
        for item in items {
            inner.upsert(item);
        }
    }

    pub fn get(&self, id: ItemId) -> Option<ItemState> {
        self.inner.read().items.get(&id).cloned()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.inner.read().items.contains_key(&id)
    }

    /// Case-insensitive substring match on name, ordered by ascending id.
    /// Only the empty query matches everything; whitespace is matched as given.
    pub fn search(&self, query: &str, params: PaginationParams) -> PaginatedResult<ItemState> {
        let needle = query.to_lowercase();
        let inner = self.inner.read();

        let matches: Vec<&ItemState> = inner
            .items
            .values()
            .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
            .collect();

        params.paginate(matches).map(|item| item.clone())
    }

    /// Every item, ascending by id
    pub fn all_items(&self) -> Vec<ItemState> {
        self.inner.read().items.values().cloned().collect()
    }

    pub fn append_history(&self, id: ItemId, price: i64, date: DateTime<Utc>) {
        let point = new_point(id, price, date);
        self.inner
            .write()
            .append_history(point, self.config.max_history_per_item);
    }

    /// Points observed within the last `days` days, oldest first.
    /// Unknown ids yield an empty vec.
    pub fn history(&self, id: ItemId, days: u32) -> Vec<HistoryPoint> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        self.history_since(id, cutoff)
    }

    /// Points with `date >= cutoff`, oldest first
    pub fn history_since(&self, id: ItemId, cutoff: DateTime<Utc>) -> Vec<HistoryPoint> {
        let inner = self.inner.read();
        let Some(points) = inner.history.get(&id) else {
            return Vec::new();
        };

        let start = points.partition_point(|p| p.date < cutoff);
        points.range(start..).cloned().collect()
    }

    pub fn history_len(&self, id: ItemId) -> usize {
        self.inner.read().history.get(&id).map_or(0, |p| p.len())
    }

    /// Run `f` with exclusive access to the whole store.
    ///
    /// Nothing else can read or write until `f` returns, so a lookup followed
    /// by a write inside `f` cannot interleave with another writer.
    pub fn update_with<R>(&self, f: impl FnOnce(&mut StoreTxn<'_>) -> R) -> R {
        let mut inner = self.inner.write();
        let mut txn = StoreTxn {
            inner: &mut *inner,
            max_history: self.config.max_history_per_item,
        };
        f(&mut txn)
    }

    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

fn new_point(id: ItemId, price: i64, date: DateTime<Utc>) -> HistoryPoint {
    HistoryPoint {
        item_id: id,
        price,
        date,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trend;
    use std::sync::Arc;
    use std::thread;

    fn item(id: ItemId, name: &str, price: i64) -> ItemState {
        ItemState {
            item_id: id,
            name: name.to_string(),
            price,
            high: price,
            low: price - 10,
            volume: 0,
            avg_24h: price,
            avg_7d: price,
            trend: Trend::Flat,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let store = StateStore::default();
        assert!(store.get(1).is_none());

        store.upsert(vec![item(1, "Rune scimitar", 15_000)]);
        assert_eq!(store.get(1).unwrap().price, 15_000);
        assert!(store.contains(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_replaces_whole_state() {
        let store = StateStore::default();
        store.upsert(vec![item(1, "Rune scimitar", 15_000)]);

        let mut replacement = item(1, "Renamed", 16_000);
        replacement.volume = 42;
        store.upsert(vec![replacement.clone()]);

        assert_eq!(store.get(1).unwrap(), replacement);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_returns_copy() {
        let store = StateStore::default();
        store.upsert(vec![item(1, "Rune scimitar", 15_000)]);

        let mut copy = store.get(1).unwrap();
        copy.price = 1;

        assert_eq!(store.get(1).unwrap().price, 15_000);
    }

    #[test]
    fn test_search_case_insensitive() {
        let store = StateStore::default();
        store.upsert(vec![
            item(1, "Rune scimitar", 15_000),
            item(2, "Dragon scimitar", 60_000),
            item(3, "Abyssal whip", 1_500_000),
        ]);

        let result = store.search("SCIM", PaginationParams::default());
        assert_eq!(result.total, 2);
        let ids: Vec<_> = result.data.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![1, 2]);

        assert_eq!(store.search("", PaginationParams::default()).total, 3);
        assert_eq!(store.search("bandos", PaginationParams::default()).total, 0);
    }

    #[test]
    fn test_search_whitespace_is_literal() {
        let store = StateStore::default();
        store.upsert(vec![
            item(1, "Runite bar", 12_000),
            item(2, "Cannonball", 160),
            item(3, "Rune scimitar", 15_000),
        ]);

        let spaced = store.search(" ", PaginationParams::default());
        let ids: Vec<_> = spaced.data.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert_eq!(store.search(" rune", PaginationParams::default()).total, 0);
        assert_eq!(store.search("rune ", PaginationParams::default()).total, 1);
    }

    #[test]
    fn test_search_pages_are_stable_and_ordered() {
        let store = StateStore::default();
        // Insert out of id order
        let items: Vec<_> = (1..=25u32)
            .rev()
            .map(|id| item(id * 7, &format!("Rune item {}", id), 100))
            .collect();
        store.upsert(items);

        let page1 = store.search("rune", PaginationParams::new(Some(1), Some(20)).unwrap());
        let page2 = store.search("rune", PaginationParams::new(Some(2), Some(20)).unwrap());

        assert_eq!(page1.data.len(), 20);
        assert_eq!(page1.total_pages, 2);
        assert_eq!(page2.data.len(), 5);

        let ids: Vec<_> = page1
            .data
            .iter()
            .chain(page2.data.iter())
            .map(|i| i.item_id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);

        let again = store.search("rune", PaginationParams::new(Some(1), Some(20)).unwrap());
        assert_eq!(again, page1);
    }

    #[test]
    fn test_history_window_and_order() {
        let store = StateStore::new(StoreConfig::unbounded());
        let now = Utc::now();

        // Appended out of order
        store.append_history(1, 300, now - Duration::hours(1));
        store.append_history(1, 100, now - Duration::days(10));
        store.append_history(1, 200, now - Duration::days(3));

        let week: Vec<_> = store.history(1, 7).iter().map(|p| p.price).collect();
        assert_eq!(week, vec![200, 300]);

        let month: Vec<_> = store.history(1, 30).iter().map(|p| p.price).collect();
        assert_eq!(month, vec![100, 200, 300]);
    }

    #[test]
    fn test_history_cutoff_is_inclusive() {
        let store = StateStore::default();
        let cutoff = Utc::now() - Duration::days(2);

        store.append_history(1, 10, cutoff - Duration::seconds(1));
        store.append_history(1, 20, cutoff);

        let points = store.history_since(1, cutoff);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].price, 20);
    }

    #[test]
    fn test_history_unknown_id_is_empty() {
        let store = StateStore::default();
        assert!(store.history(999, 7).is_empty());
        assert_eq!(store.history_len(999), 0);
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let store = StateStore::new(StoreConfig {
            max_history_per_item: Some(3),
        });
        let now = Utc::now();

        for (i, price) in [10, 20, 30, 40].into_iter().enumerate() {
            store.append_history(1, price, now - Duration::minutes(10 - i as i64));
        }
        // Late arrival older than everything retained
        store.append_history(1, 5, now - Duration::hours(1));

        let prices: Vec<_> = store.history(1, 1).iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![20, 30, 40]);
    }

    #[test]
    fn test_update_with_read_modify_write() {
        let store = StateStore::default();
        store.upsert(vec![item(1, "Rune scimitar", 15_000)]);

        let previous = store.update_with(|txn| {
            let previous = txn.get(1).map(|i| i.price);
            let mut next = txn.get(1).cloned().unwrap();
            next.price = 15_500;
            txn.append_history(1, next.price, Utc::now());
            txn.upsert(next);
            previous
        });

        assert_eq!(previous, Some(15_000));
        assert_eq!(store.get(1).unwrap().price, 15_500);
        assert_eq!(store.history_len(1), 1);
    }

    #[test]
    fn test_concurrent_upsert_get_disjoint_ids() {
        let store = Arc::new(StateStore::default());

        let writers: Vec<_> = (0..4u32)
            .map(|w| {
                let store = store.clone();
                thread::spawn(move || {
                    for n in 0..250u32 {
                        let id = w * 1_000 + n;
                        store.upsert(vec![item(id, "Writer item", i64::from(id) + 10)]);
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4u32)
            .map(|r| {
                let store = store.clone();
                thread::spawn(move || {
                    for n in 0..250u32 {
                        let id = r * 1_000 + n;
                        if let Some(state) = store.get(id) {
                            // Never half written: every field comes from the same upsert
                            assert_eq!(state.item_id, id);
                            assert_eq!(state.price, i64::from(id) + 10);
                            assert_eq!(state.low, state.price - 10);
                        }
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1_000);
    }
}
