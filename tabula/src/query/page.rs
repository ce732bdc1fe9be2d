//! Page window arithmetic.

use serde::{Deserialize, Serialize};

/// The slice of a filtered result shown as one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// 1-based page actually served
    pub page: usize,
    /// Total pages; at least 1 even for an empty result
    pub pages: usize,
    pub page_size: usize,
    pub offset: usize,
    /// Rows on this page
    pub limit: usize,
    pub total: usize,
}

impl PageWindow {
    /// Computes the window for `requested_page`, clamped into `[1, pages]`.
    ///
    /// ```rust
    /// use tabula::query::PageWindow;
    ///
    /// let window = PageWindow::compute(120, 50, 3);
    /// assert_eq!((window.pages, window.offset, window.limit), (3, 100, 20));
    ///
    /// let empty = PageWindow::compute(0, 50, 7);
    /// assert_eq!((empty.page, empty.pages, empty.limit), (1, 1, 0));
    /// ```
    pub fn compute(total: usize, page_size: usize, requested_page: i64) -> Self {
        let page_size = page_size.max(1);
        let pages = total.div_ceil(page_size).max(1);
        let page = usize::try_from(requested_page.max(1))
            .unwrap_or(usize::MAX)
            .min(pages);
        let offset = (page - 1) * page_size;
        let limit = page_size.min(total.saturating_sub(offset));
        Self {
            page,
            pages,
            page_size,
            offset,
            limit,
            total,
        }
    }

    pub fn is_last(&self) -> bool {
        self.page == self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let w = PageWindow::compute(120, 50, 1);
        assert_eq!(w.page, 1);
        assert_eq!(w.pages, 3);
        assert_eq!(w.offset, 0);
        assert_eq!(w.limit, 50);
    }

    #[test]
    fn test_page_beyond_end_is_clamped() {
        let w = PageWindow::compute(120, 50, 99);
        assert_eq!(w.page, 3);
        assert_eq!(w.offset, 100);
        assert_eq!(w.limit, 20);
        assert!(w.is_last());
    }

    #[test]
    fn test_non_positive_page_is_first() {
        assert_eq!(PageWindow::compute(10, 5, 0).page, 1);
        assert_eq!(PageWindow::compute(10, 5, -4).page, 1);
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let w = PageWindow::compute(3, 0, 2);
        assert_eq!(w.page_size, 1);
        assert_eq!(w.pages, 3);
        assert_eq!(w.offset, 1);
        assert_eq!(w.limit, 1);
    }

    #[test]
    fn test_exact_multiple() {
        let w = PageWindow::compute(100, 50, 2);
        assert_eq!(w.pages, 2);
        assert_eq!(w.limit, 50);
    }
}
