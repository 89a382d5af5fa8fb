//! Client-side page slicing

use std::ops::Range;

/// Rows per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 1-based page cursor over an in-memory collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Always at least 1, so an empty list still has a page to sit on
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    pub fn set_page(&mut self, page: usize, total: usize) {
        self.page = page.clamp(1, self.page_count(total));
    }

    /// Changing the size always returns to page 1
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Pull the cursor back when the collection shrank under it
    pub fn clamp(&mut self, total: usize) {
        self.page = self.page.min(self.page_count(total));
    }

    pub fn range(&self, total: usize) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }
}
