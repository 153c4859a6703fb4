//! Pagination over the merged ranking.

use serde::{Deserialize, Serialize};

/// One page of a ranked sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Length of the full sequence the page was cut from.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Number of pages needed to cover `total` items.
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Slices an already ranked sequence into 1-indexed pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
    page_size: usize,
}

impl Paginator {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Returns `[(page-1)*page_size, page*page_size)` clamped to the input.
    /// A page past the end is empty, not an error.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let start = self.page.saturating_sub(1).saturating_mul(self.page_size);
        let items = items
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect();

        Page {
            items,
            total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
