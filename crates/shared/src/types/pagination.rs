//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Largest page size a caller may request.
    pub const MAX_PER_PAGE: u32 = 100;

    /// Returns the 0-indexed page number.
    #[must_use]
    pub fn page_index(&self) -> u64 {
        u64::from(self.page.max(1) - 1)
    }

    /// Returns the page size, clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn page_size(&self) -> u64 {
        u64::from(self.per_page.clamp(1, Self::MAX_PER_PAGE))
    }

    /// Rows to skip before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page_index() * self.page_size()
    }

    /// Wraps one page of results, echoing the normalized page parameters.
    #[must_use]
    pub fn respond<T>(&self, data: Vec<T>, total: u64) -> PageResponse<T> {
        PageResponse::new(
            data,
            self.page.max(1),
            self.per_page.clamp(1, Self::MAX_PER_PAGE),
            total,
        )
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u32,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if total == 0 || per_page == 0 {
            1
        } else {
            u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
        };

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }
}
