use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// PageRequest
///
/// A normalized page window: `page` is 1-based, `limit` is clamped to
/// `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Builds a request only when the caller asked for pagination.
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Option<Self> {
        if page.is_none() && limit.is_none() {
            None
        } else {
            Some(Self::new(page, limit))
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// Page
///
/// Paginated envelope: the requested slice plus the total match count and the
/// neighbouring page numbers, `None` where no such page exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Page<T> {
    /// Matches across all pages.
    pub total: u64,
    pub next: Option<u32>,
    pub prev: Option<u32>,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: u64, data: Vec<T>) -> Self {
        let seen = u64::from(request.page) * u64::from(request.limit);
        Self {
            total,
            next: (seen < total).then(|| request.page + 1),
            prev: (request.page > 1).then(|| request.page - 1),
            data,
        }
    }
}
