//! Page bookkeeping for search results.
//!
//! Tracks the desired page, the best-known total-page count, and the
//! aggregated items. Supports two view modes: replace (classic pager) and
//! append (infinite scroll). Only one fetch may be in flight at a time:
//! next-page triggers while loading are dropped, a fresh page-1 search
//! supersedes whatever is running, and responses for a page that is no
//! longer the desired one are ignored.

use crate::domain::models::{NormalizedRecord, ResultPage, MAX_PAGE_SIZE};

#[derive(Debug)]
pub struct Paginator {
    page_size: u32,
    desired_page: u32,
    total_pages: Option<u32>,
    items: Vec<NormalizedRecord>,
    in_flight: bool,
    append: bool,
}

impl Paginator {
    pub fn new(page_size: u32, append: bool) -> Self {
        Self {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            desired_page: 0,
            total_pages: None,
            items: Vec::new(),
            in_flight: false,
            append,
        }
    }

    /// Start a fetch for `page`. Returns false when the request must not go
    /// out: another fetch is in flight (unless this is a fresh page-1
    /// search, which supersedes it) or the page lies beyond the last known
    /// page.
    pub fn begin(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if self.in_flight && page != 1 {
            return false;
        }
        if let Some(total) = self.total_pages {
            if page > total {
                return false;
            }
        }
        self.desired_page = page;
        self.in_flight = true;
        true
    }

    /// Start a fetch for the page after the current one, if any.
    pub fn begin_next(&mut self) -> Option<u32> {
        if self.in_flight {
            return None;
        }
        let next = self.desired_page + 1;
        if let Some(total) = self.total_pages {
            if next > total {
                return None;
            }
        }
        self.desired_page = next;
        self.in_flight = true;
        Some(next)
    }

    /// Fold a page response into the state. Returns false when the response
    /// is stale (its page is no longer the desired one) and was dropped.
    pub fn accept(&mut self, page: u32, result: &ResultPage) -> bool {
        if page != self.desired_page {
            return false;
        }
        self.in_flight = false;

        let short = (result.items.len() as u32) < self.page_size;
        let reported = result
            .total
            .map(|total| (total.div_ceil(self.page_size as u64)).max(1) as u32);
        // A short page caps the page count at this page; a reported total
        // sets it; a full page without a total leaves it open-ended.
        self.total_pages = if short {
            Some(page.min(reported.unwrap_or(page)).max(1))
        } else {
            reported.or(self.total_pages)
        };

        if self.append && page > 1 {
            self.items.extend(result.items.iter().cloned());
        } else {
            self.items = result.items.clone();
        }
        true
    }

    pub fn has_more(&self) -> bool {
        match self.total_pages {
            Some(total) => self.desired_page < total,
            None => true,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.desired_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn items(&self) -> &[NormalizedRecord] {
        &self.items
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}
