//! Fixed-size pagination over an ordered result set.
//!
//! Out-of-range page numbers are clamped to the nearest valid page instead of
//! failing: `0` and negatives become page 1, anything past the end becomes
//! the last page. An empty result set has zero pages and a single empty
//! page numbered 1.

use scribe_types::api::PageMeta;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Parse the raw `?page=` value. Missing or non-numeric input means page 1.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

/// Which slice of the result set a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> usize {
        self.count.div_ceil(self.per_page)
    }

    pub fn clamp(&self, requested: i64) -> usize {
        let last = self.num_pages().max(1) as i64;
        requested.clamp(1, last) as usize
    }

    pub fn window(&self, requested: i64) -> PageWindow {
        let number = self.clamp(requested);
        PageWindow {
            number,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }

    pub fn meta(&self, number: usize) -> PageMeta {
        let total_pages = self.num_pages();
        PageMeta {
            number,
            total_pages,
            count: self.count,
            has_next: number < total_pages,
            has_previous: number > 1,
        }
    }
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            meta: Paginator::new(0, DEFAULT_PAGE_SIZE).meta(1),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Slice an already ordered, fully materialized list.
pub fn paginate<T>(items: Vec<T>, per_page: usize, requested: i64) -> Page<T> {
    let paginator = Paginator::new(items.len(), per_page);
    let window = paginator.window(requested);

    Page {
        items: items
            .into_iter()
            .skip(window.offset)
            .take(window.limit)
            .collect(),
        meta: paginator.meta(window.number),
    }
}
