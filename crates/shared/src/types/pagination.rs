//! Paging for invoice and profile listings.

use serde::{Deserialize, Serialize};

const FIRST_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Page selection as received in a query string.
///
/// Values are taken as sent; call [`PageRequest::normalized`] before
/// querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub per_page: u32,
}

fn first_page() -> u32 {
    FIRST_PAGE
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::from_parts(None, None)
    }
}

impl PageRequest {
    /// Builds a request from optional query values, filling the gaps with
    /// the defaults.
    #[must_use]
    pub fn from_parts(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(FIRST_PAGE),
            per_page: per_page.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// Page 0 becomes page 1 and the size is kept within `1..=100`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(FIRST_PAGE),
            per_page: self.per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// 0-based page index, as SeaORM paginators expect.
    #[must_use]
    pub fn index(&self) -> u64 {
        u64::from(self.page.saturating_sub(1))
    }

    /// Rows skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.index() * self.limit()
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

/// One page of a listing plus the counts a client needs to page further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    /// Matching rows across every page.
    pub total: u64,
    /// At least 1, so an empty listing still reports a single page.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Wraps the rows fetched for `request` out of `total` matches.
    #[must_use]
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        let total_pages = match request.limit() {
            0 => 1,
            size => total.div_ceil(size).max(1),
        };

        Self {
            data,
            meta: PageMeta {
                page: request.page,
                per_page: request.per_page,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_fills_missing_values() {
        assert_eq!(
            PageRequest::from_parts(None, Some(50)),
            PageRequest { page: 1, per_page: 50 }
        );
        assert_eq!(PageRequest::default(), PageRequest { page: 1, per_page: 20 });
    }

    #[test]
    fn test_query_string_defaults() {
        let request: PageRequest = serde_json::from_str(r#"{"page": 4}"#).unwrap();
        assert_eq!(request, PageRequest { page: 4, per_page: 20 });
    }

    #[test]
    fn test_normalized_clamps_out_of_range_values() {
        let request = PageRequest { page: 0, per_page: 1000 }.normalized();
        assert_eq!(request, PageRequest { page: 1, per_page: 100 });

        let request = PageRequest { page: 2, per_page: 0 }.normalized();
        assert_eq!(request.per_page, 1);
    }

    #[test]
    fn test_index_and_offset() {
        let request = PageRequest { page: 3, per_page: 25 };
        assert_eq!(request.index(), 2);
        assert_eq!(request.offset(), 50);
        assert_eq!(PageRequest { page: 0, per_page: 25 }.index(), 0);
    }

    #[test]
    fn test_total_pages_never_zero() {
        let request = PageRequest::default();
        assert_eq!(PageResponse::<u8>::new(vec![], &request, 0).meta.total_pages, 1);
        assert_eq!(PageResponse::<u8>::new(vec![], &request, 20).meta.total_pages, 1);
        assert_eq!(PageResponse::<u8>::new(vec![], &request, 41).meta.total_pages, 3);
    }
}
