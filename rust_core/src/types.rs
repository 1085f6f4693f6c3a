//! Domain types shared by the ingestion and query paths.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::pricing::{self, FlipMetrics};

/// Upstream item identifier
pub type ItemId = u32;

/// One fetch worth of snapshots, keyed by item
pub type SnapshotBatch = HashMap<ItemId, PriceSnapshot>;

/// Item id -> display name, as published by the upstream mapping endpoint
pub type NameMapping = HashMap<ItemId, String>;

/// Price direction relative to the 24h trailing average
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Flat,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Flat => "FLAT",
        }
    }
}

/// Current known state of a tradeable item.
///
/// Values of this type are always copies; the store keeps its own instance
/// and hands out clones, so callers can never mutate stored state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemState {
    pub item_id: ItemId,
    pub name: String,
    /// Representative price (high, falling back to low)
    pub price: i64,
    /// Instant-buy quote
    pub high: i64,
    /// Instant-sell quote
    pub low: i64,
    pub volume: i64,
    pub avg_24h: i64,
    pub avg_7d: i64,
    pub trend: Trend,
    pub updated_at: DateTime<Utc>,
}

impl ItemState {
    /// Flip economics when buying at `low` and selling at `high`.
    pub fn flip_metrics(&self) -> FlipMetrics {
        pricing::flip_metrics(self.low, self.high)
    }
}

/// One upstream observation of an item's quotes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub high: i64,
    pub low: i64,
    #[serde(default)]
    pub volume: Option<i64>,
}

impl PriceSnapshot {
    pub fn new(high: i64, low: i64) -> Self {
        Self {
            high,
            low,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: i64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// High quote if present, otherwise low. `None` when neither is usable.
    pub fn representative_price(&self) -> Option<i64> {
        match (self.high, self.low) {
            (0, 0) => None,
            (0, low) => Some(low),
            (high, _) => Some(high),
        }
    }
}

/// Append-only record of an accepted observation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub item_id: ItemId,
    pub price: i64,
    /// Logical observation time (the batch fetch time)
    pub date: DateTime<Utc>,
    /// Wall-clock time the record was appended
    pub created_at: DateTime<Utc>,
}

/// History point as exposed to the serving layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    /// RFC 3339
    pub date: String,
    pub price: i64,
}

impl From<&HistoryPoint> for PriceHistoryEntry {
    fn from(point: &HistoryPoint) -> Self {
        Self {
            date: point.date.to_rfc3339_opts(SecondsFormat::Secs, true),
            price: point.price,
        }
    }
}
