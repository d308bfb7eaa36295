//! Offset pagination utilities.

use serde::Serialize;

/// A resolved page request: 1-based page number, bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Resolves optional caller input into a bounded page request.
    ///
    /// Missing or zero pages become page 1; the page size falls back to
    /// `default_size` and is clamped into `1..=max_size`.
    pub fn resolve(
        page: Option<u32>,
        page_size: Option<u32>,
        default_size: u32,
        max_size: u32,
    ) -> Self {
        let max_size = max_size.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, max_size),
        }
    }

    /// Zero-based offset of the first row on this page.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    /// Number of rows on a full page.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Slices an already-filtered list down to this page.
    ///
    /// Pages past the end yield an empty vector.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(offset)
            .take(self.page_size as usize)
            .collect()
    }
}
