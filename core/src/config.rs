//! Configuration for the sync controller and its HTTP store.

use std::time::Duration;

use crate::pagination::PAGE_SIZE;

/// Page count shown before the first fetch reports the real one.
pub const PROVISIONAL_TOTAL_PAGES: u32 = 4;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend root, without the `/todos` suffix.
    pub base_url: String,
    /// Items per page.
    pub page_size: u32,
    /// `total_pages` exposed until a fetch succeeds.
    pub initial_total_pages: u32,
    /// Per-request timeout for the HTTP transport.
    pub request_timeout: Duration,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: PAGE_SIZE,
            initial_total_pages: PROVISIONAL_TOTAL_PAGES,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_initial_total_pages(mut self, pages: u32) -> Self {
        self.initial_total_pages = pages.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}
