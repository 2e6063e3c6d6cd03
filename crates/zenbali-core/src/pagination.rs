//! Page windows for listing queries.

use serde::Serialize;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A normalized page window: `page >= 1`, `1 <= limit <= MAX_PAGE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// Normalize caller input. A page below 1 becomes 1; a limit of 0 or
    /// absent becomes the default and one above the maximum is clamped.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = match limit {
            None | Some(0) => DEFAULT_PAGE_LIMIT,
            Some(l) => l.min(MAX_PAGE_LIMIT),
        };
        Self { page, limit }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the totals needed to render pagers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total matching items across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Number of pages for `total` at this page size.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from its items, the overall total and the window used.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, window: Pagination) -> Self {
        Self {
            items,
            total,
            page: window.page(),
            limit: window.limit(),
            total_pages: total.div_ceil(u64::from(window.limit())),
        }
    }

    /// Transform each item, keeping the totals.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}
