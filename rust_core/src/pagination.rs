//! Page/limit handling for list and search results.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;
pub const MAX_PAGE: u32 = 10_000;

/// Validated pagination request (1-based page)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    page: u32,
    limit: u32,
}

impl PaginationParams {
    /// Build from optional raw values, applying defaults for missing ones.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> QueryResult<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(QueryError::validation("page must be >= 1"));
        }
        if page > MAX_PAGE {
            return Err(QueryError::validation(format!(
                "page number too large (max {})",
                MAX_PAGE
            )));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(QueryError::validation(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items to skip
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Slice one page out of an already ordered result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> PaginatedResult<T> {
        let total = items.len();
        let data = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit as usize)
            .collect();

        PaginatedResult {
            data,
            total,
            page: self.page,
            limit: self.limit,
            total_pages: total_pages(total, self.limit),
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub total_pages: usize,
}

impl<T> PaginatedResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// ceil(total / limit)
fn total_pages(total: usize, limit: u32) -> usize {
    let limit = limit.max(1) as usize;
    (total + limit - 1) / limit
}
