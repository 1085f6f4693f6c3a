//! Read-side operations over the state store.
//!
//! Every input is validated before the store is touched. Out-of-range values
//! are rejected, never clamped.

use std::sync::Arc;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::pagination::{PaginatedResult, PaginationParams};
use crate::store::StateStore;
use crate::types::{ItemId, ItemState, PriceHistoryEntry};

pub const MIN_ITEM_ID: ItemId = 1;
pub const MAX_ITEM_ID: ItemId = 10_000_000;
pub const MAX_QUERY_LENGTH: usize = 100;
pub const DEFAULT_HISTORY_DAYS: u32 = 7;
pub const MIN_HISTORY_DAYS: u32 = 1;
pub const MAX_HISTORY_DAYS: u32 = 30;

const FORBIDDEN_QUERY_CHARS: &[char] = &['<', '>', '"', '\'', '&'];
const MAX_ITEM_ID_DIGITS: usize = 10;

pub struct ItemQueryService {
    store: Arc<StateStore>,
}

impl ItemQueryService {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    pub fn get_item(&self, id: ItemId) -> QueryResult<ItemState> {
        validate_item_id(id)?;
        self.store
            .get(id)
            .ok_or_else(|| QueryError::NotFound(format!("item {}", id)))
    }

    /// Name search, ascending by id. A missing or empty query lists everything.
    pub fn search_items(
        &self,
        query: Option<&str>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> QueryResult<PaginatedResult<ItemState>> {
        let query = query.unwrap_or("");
        validate_query(query)?;
        let params = PaginationParams::new(page, limit)?;

        let result = self.store.search(query, params);
        debug!(
            "Search '{}' page {} -> {} of {} items",
            query,
            params.page(),
            result.data.len(),
            result.total
        );
        Ok(result)
    }

    /// History for the last `days` days (default 7), oldest first.
    pub fn price_history(&self, id: ItemId, days: Option<u32>) -> QueryResult<Vec<PriceHistoryEntry>> {
        validate_item_id(id)?;
        let days = validate_days(days)?;

        if !self.store.contains(id) {
            return Err(QueryError::NotFound(format!("item {}", id)));
        }

        Ok(self
            .store
            .history(id, days)
            .iter()
            .map(PriceHistoryEntry::from)
            .collect())
    }
}

/// Parse a raw id string (e.g. a path segment) into a validated id.
pub fn parse_item_id(raw: &str) -> QueryResult<ItemId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QueryError::validation("item ID is required"));
    }
    if raw.len() > MAX_ITEM_ID_DIGITS {
        return Err(QueryError::validation("item ID too long"));
    }

    let id = raw
        .parse::<ItemId>()
        .map_err(|_| QueryError::validation("invalid item ID format"))?;
    validate_item_id(id)?;
    Ok(id)
}

fn validate_item_id(id: ItemId) -> QueryResult<()> {
    if !(MIN_ITEM_ID..=MAX_ITEM_ID).contains(&id) {
        return Err(QueryError::validation("item ID out of valid range"));
    }
    Ok(())
}

fn validate_query(query: &str) -> QueryResult<()> {
    // Limit is in bytes
    if query.len() > MAX_QUERY_LENGTH {
        return Err(QueryError::validation(format!(
            "query string too long (max {} characters)",
            MAX_QUERY_LENGTH
        )));
    }
    if query.contains(FORBIDDEN_QUERY_CHARS) {
        return Err(QueryError::validation("query contains invalid characters"));
    }
    Ok(())
}

fn validate_days(days: Option<u32>) -> QueryResult<u32> {
    let days = days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if !(MIN_HISTORY_DAYS..=MAX_HISTORY_DAYS).contains(&days) {
        return Err(QueryError::validation(format!(
            "days must be between {} and {}",
            MIN_HISTORY_DAYS, MAX_HISTORY_DAYS
        )));
    }
    Ok(days)
}
