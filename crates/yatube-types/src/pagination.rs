use serde::{Deserialize, Serialize};

pub const POSTS_PER_PAGE: u32 = 10;

/// Splits `count` items into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u32,
}

/// The slice of rows a resolved page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub offset: u64,
    pub limit: u32,
}

impl Paginator {
    pub fn new(count: u64, per_page: u32) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Always at least one page, even for an empty list.
    pub fn num_pages(&self) -> u32 {
        let pages = self.count.div_ceil(u64::from(self.per_page));
        pages.max(1).min(u64::from(u32::MAX)) as u32
    }

    /// Resolves a raw `?page=` value leniently: anything unparsable yields the
    /// first page, anything out of range yields the last one.
    pub fn get_page(&self, raw: Option<&str>) -> PageWindow {
        let last = self.num_pages();
        let number = match raw.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n >= 1 && n <= i64::from(last) => n as u32,
            Some(Ok(_)) => last,
            _ => 1,
        };
        PageWindow {
            number,
            offset: u64::from(number - 1) * u64::from(self.per_page),
            limit: self.per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u32>,
    pub previous_page_number: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, paginator: &Paginator) -> Self {
        let num_pages = paginator.num_pages();
        let has_next = window.number < num_pages;
        let has_previous = window.number > 1;
        Self {
            items,
            number: window.number,
            num_pages,
            count: paginator.count(),
            has_next,
            has_previous,
            next_page_number: has_next.then(|| window.number + 1),
            previous_page_number: has_previous.then(|| window.number - 1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
