//! Keyset pagination.
//!
//! A page token is literally the key of the last row on the previous page.
//! Stores fetch `page_size + 1` rows ordered by key and strictly greater than
//! the token; the extra row only signals that another page exists.

use serde::{Deserialize, Serialize};

/// Page size used when the caller asks for zero rows.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A request for one page of a keyset-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page_size: u32,
    page_token: Option<String>,
}

impl PageRequest {
    /// Creates a page request, clamping the size to `1..=MAX_PAGE_SIZE`.
    ///
    /// A size of zero selects [`DEFAULT_PAGE_SIZE`]. An empty token is
    /// treated as "start from the beginning".
    pub fn new(page_size: u32, page_token: Option<String>) -> Self {
        let page_size = match page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let page_token = page_token.filter(|t| !t.is_empty());
        Self {
            page_size,
            page_token,
        }
    }

    /// Requests the first page.
    pub fn first(page_size: u32) -> Self {
        Self::new(page_size, None)
    }

    /// Requests the page following `token`.
    pub fn after(page_size: u32, token: impl Into<String>) -> Self {
        Self::new(page_size, Some(token.into()))
    }

    /// Returns the effective page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the token, if this is not the first page.
    pub fn page_token(&self) -> Option<&str> {
        self.page_token.as_deref()
    }

    /// Number of rows a store should fetch: one more than the page size.
    pub fn fetch_limit(&self) -> i64 {
        i64::from(self.page_size) + 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows on this page, in ascending key order.
    pub items: Vec<T>,

    /// Key of the last row on this page when more rows follow.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// Builds a page from an over-fetched, key-ordered result set.
    ///
    /// `rows` must hold at most `request.fetch_limit()` rows. When it holds
    /// more than `page_size`, the surplus is dropped and the token becomes
    /// the key of the last row kept.
    pub fn from_overfetch<F>(mut rows: Vec<T>, request: &PageRequest, key: F) -> Self
    where
        F: Fn(&T) -> String,
    {
        let page_size = request.page_size() as usize;
        let next_page_token = if rows.len() > page_size {
            rows.truncate(page_size);
            rows.last().map(key)
        } else {
            None
        };

        Self {
            items: rows,
            next_page_token,
        }
    }

    /// Returns true when no page follows this one.
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }

    /// Transforms every item, keeping the token.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("k{i:02}")).collect()
    }

    #[test]
    fn zero_size_uses_default() {
        assert_eq!(PageRequest::first(0).page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn size_is_clamped_to_max() {
        assert_eq!(PageRequest::first(10_000).page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn empty_token_means_first_page() {
        let request = PageRequest::new(5, Some(String::new()));
        assert_eq!(request.page_token(), None);
    }

    #[test]
    fn fetch_limit_over_fetches_by_one() {
        assert_eq!(PageRequest::first(3).fetch_limit(), 4);
    }

    #[test]
    fn surplus_row_yields_token_of_last_kept_row() {
        let request = PageRequest::first(3);
        let page = Page::from_overfetch(keys(4), &request, Clone::clone);

        assert_eq!(page.items, vec!["k00", "k01", "k02"]);
        assert_eq!(page.next_page_token.as_deref(), Some("k02"));
        assert!(!page.is_last());
    }

    #[test]
    fn exact_fit_is_last_page() {
        let request = PageRequest::first(3);
        let page = Page::from_overfetch(keys(3), &request, Clone::clone);

        assert_eq!(page.items.len(), 3);
        assert!(page.is_last());
    }

    #[test]
    fn short_page_is_last_page() {
        let request = PageRequest::first(3);
        let page = Page::from_overfetch(keys(1), &request, Clone::clone);

        assert_eq!(page.items.len(), 1);
        assert!(page.is_last());
    }

    #[test]
    fn map_keeps_token() {
        let request = PageRequest::first(1);
        let page = Page::from_overfetch(keys(2), &request, Clone::clone).map(|k| k.len());

        assert_eq!(page.items, vec![3]);
        assert_eq!(page.next_page_token.as_deref(), Some("k00"));
    }

    #[test]
    fn page_request_serialization_roundtrip() {
        let request = PageRequest::after(7, "abc");
        let json = serde_json::to_string(&request).unwrap();
        let back: PageRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }
}
