//! Offset pagination shared by every list endpoint.
//!
//! Requests carry a 1-indexed page number and a page size; responses wrap the
//! items with the totals a client needs to render a pager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page number (1-indexed)
const DEFAULT_PAGE: u32 = 1;

/// Default items per page
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Maximum items per page
pub const MAX_PER_PAGE: u32 = 100;

/// Page selection for list queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Build a request, clamping out-of-range values instead of rejecting
    /// them: a zero page or size falls back to the default, and sizes above
    /// [`MAX_PER_PAGE`] are capped.
    pub fn new(page: u32, per_page: u32) -> Self {
        let page = if page == 0 { DEFAULT_PAGE } else { page };
        let per_page = if per_page == 0 {
            DEFAULT_PER_PAGE
        } else {
            per_page.min(MAX_PER_PAGE)
        };

        Self { page, per_page }
    }

    /// Re-apply the clamping rules, for values that arrived via `Deserialize`.
    pub fn sanitized(self) -> Self {
        Self::new(self.page, self.per_page)
    }

    /// Offset for database queries (0-indexed).
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.per_page
    }

    /// Limit for database queries.
    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

/// One page of results plus the totals needed to page further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items for the current page
    pub items: Vec<T>,

    /// Current page number (1-indexed)
    pub page: u32,

    /// Items per page
    pub per_page: u32,

    /// Total number of items across all pages
    pub total: u64,

    /// Total number of pages
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Create a page from the items, the request that produced them and the
    /// total matching count.
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total - 1) / request.per_page as u64 + 1) as u32
        };

        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages,
        }
    }

    /// An empty page for the given request.
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }

    /// Map the items to a different type, keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Inclusive date window for list filters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// Start of the window (inclusive)
    pub start: Option<DateTime<Utc>>,

    /// End of the window (inclusive)
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Create a new date range.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Reject ranges that end before they start.
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err("Start date must be before or equal to end date".to_string());
            }
        }
        Ok(())
    }

    /// Check whether a timestamp falls inside the window.
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        let after_start = self.start.map_or(true, |start| at >= &start);
        let before_end = self.end.map_or(true, |end| at <= &end);
        after_start && before_end
    }
}
