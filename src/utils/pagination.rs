//! # Page-Number Pagination
//!
//! Shared by every listing endpoint. `page` starts at 1 and page 1 is always
//! valid, even for an empty collection. Any page past the last one, or a page
//! that is not a positive integer, is a `404 Invalid page.` rather than an
//! empty result.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::utils::constant::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Raw `?page=&page_size=` query. Values are kept as text so that garbage
/// input maps to the same 404 as an out-of-range page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Checks the page against the total row count.
    pub fn ensure_in_range(&self, count: i64) -> AppResult<()> {
        if self.page > 1 && self.offset() >= count {
            return Err(AppError::NotFound("Invalid page."));
        }
        Ok(())
    }
}

impl TryFrom<PageQuery> for PageRequest {
    type Error = AppError;

    fn try_from(query: PageQuery) -> Result<Self, Self::Error> {
        let page = match query.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or(AppError::NotFound("Invalid page."))?,
        };
        let page_size = match query.page_size.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_PAGE_SIZE,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|s| *s >= 1)
                .ok_or(AppError::NotFound("Invalid page."))?
                .min(MAX_PAGE_SIZE),
        };
        Ok(Self { page, page_size })
    }
}

/// Paginated response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, request: PageRequest) -> Self {
        let shown = request.offset() + results.len() as i64;
        Self {
            count,
            next: (shown < count).then_some(request.page + 1),
            previous: (request.page > 1).then(|| request.page - 1),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn defaults_apply() {
        let req = PageRequest::try_from(PageQuery::default()).unwrap();
        assert_eq!(req, PageRequest { page: 1, page_size: DEFAULT_PAGE_SIZE });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn page_size_is_capped() {
        let req = PageRequest::try_from(query(Some("2"), Some("1000"))).unwrap();
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert_eq!(req.offset(), i64::from(MAX_PAGE_SIZE));
    }

    #[test]
    fn garbage_pages_are_not_found() {
        for (page, size) in [(Some("0"), None), (Some("abc"), None), (None, Some("0")), (Some("-1"), None)] {
            assert!(matches!(
                PageRequest::try_from(query(page, size)),
                Err(AppError::NotFound(_))
            ));
        }
    }

    #[test]
    fn fifteen_rows_in_pages_of_six() {
        let count = 15;
        for page in 1..=3 {
            let req = PageRequest { page, page_size: 6 };
            assert!(req.ensure_in_range(count).is_ok());
        }
        let req = PageRequest { page: 4, page_size: 6 };
        assert!(matches!(req.ensure_in_range(count), Err(AppError::NotFound(_))));
    }

    #[test]
    fn first_page_of_empty_collection_is_valid() {
        let req = PageRequest { page: 1, page_size: 6 };
        assert!(req.ensure_in_range(0).is_ok());
        let page: Page<u8> = Page::new(vec![], 0, req);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }

    #[test]
    fn next_and_previous_links() {
        let page = Page::new(vec![0u8; 6], 15, PageRequest { page: 2, page_size: 6 });
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));

        let last = Page::new(vec![0u8; 3], 15, PageRequest { page: 3, page_size: 6 });
        assert_eq!(last.next, None);
    }
}
