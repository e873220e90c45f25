//! Offset pagination
//!
//! Pages are 1-based. Out-of-range inputs are clamped, never rejected, and
//! no upper bound applies: a page past the end simply yields no data.

use serde::{Deserialize, Serialize};

/// Page size used when the caller supplies a non-positive one.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// A clamped page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Build a request from raw parameters.
    ///
    /// `page < 1` becomes 1; `per_page < 1` becomes [`DEFAULT_PER_PAGE`].
    pub fn new(page: i64, per_page: i64) -> Self {
        Self::with_default(page, per_page, DEFAULT_PER_PAGE)
    }

    /// Build a request with a caller-chosen fallback page size.
    pub fn with_default(page: i64, per_page: i64, default_per_page: u32) -> Self {
        let page = if page < 1 { 1 } else { clamp_u32(page) };
        let per_page = if per_page < 1 {
            default_per_page.max(1)
        } else {
            clamp_u32(per_page)
        };
        Self { page, per_page }
    }

    /// Build a request with a fixed page size.
    pub fn fixed(page: i64, per_page: u32) -> Self {
        Self::with_default(page, i64::from(per_page), per_page)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Number of rows to return.
    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Number of pages needed for `total` rows.
pub fn last_page(total: u64, per_page: u32) -> u64 {
    total.div_ceil(u64::from(per_page.max(1)))
}

/// Pagination metadata returned next to a page of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Pagination {
    pub current_page: u32,
    pub last_page: u64,
    /// Total matching rows, independent of the page window
    pub total: u64,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub paginate: Pagination,
}

impl<T> PageResult<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            paginate: Pagination {
                current_page: request.page(),
                last_page: last_page(total, request.per_page()),
                total,
            },
        }
    }

    /// Transform the page items, keeping the pagination metadata.
    pub fn map<U, F>(self, f: F) -> PageResult<U>
    where
        F: FnMut(T) -> U,
    {
        PageResult {
            data: self.data.into_iter().map(f).collect(),
            paginate: self.paginate,
        }
    }

    pub fn total(&self) -> u64 {
        self.paginate.total
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
