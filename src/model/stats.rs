//! Crawl statistics with lock-free counters
//!
//! Fetch workers update the tracker concurrently; observers only ever see
//! snapshots. Every counter is monotonic for the life of a tracker.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a session's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    pub total_pages: u64,
    pub successful_pages: u64,
    pub failed_pages: u64,
    pub screenshots_taken: u64,
    pub scroll_attempts: u64,
    pub raw_items_extracted: u64,
    pub filtered_items: u64,
    pub cybersecurity_articles: u64,
}

impl CrawlStats {
    /// True when every counter of `self` is >= the matching counter of `earlier`
    #[must_use]
    pub fn dominates(&self, earlier: &CrawlStats) -> bool {
        self.total_pages >= earlier.total_pages
            && self.successful_pages >= earlier.successful_pages
            && self.failed_pages >= earlier.failed_pages
            && self.screenshots_taken >= earlier.screenshots_taken
            && self.scroll_attempts >= earlier.scroll_attempts
            && self.raw_items_extracted >= earlier.raw_items_extracted
            && self.filtered_items >= earlier.filtered_items
            && self.cybersecurity_articles >= earlier.cybersecurity_articles
    }
}

/// Shared, monotonic stats accumulator for one session
#[derive(Debug, Default)]
pub struct StatsTracker {
    total_pages: AtomicU64,
    successful_pages: AtomicU64,
    failed_pages: AtomicU64,
    screenshots_taken: AtomicU64,
    scroll_attempts: AtomicU64,
    raw_items_extracted: AtomicU64,
    filtered_items: AtomicU64,
    cybersecurity_articles: AtomicU64,
}

impl StatsTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_attempted(&self) {
        self.total_pages.fetch_add(1, Ordering::SeqCst);
    }

    pub fn page_succeeded(&self) {
        self.successful_pages.fetch_add(1, Ordering::SeqCst);
    }

    pub fn page_failed(&self) {
        self.failed_pages.fetch_add(1, Ordering::SeqCst);
    }

    pub fn screenshot_taken(&self) {
        self.screenshots_taken.fetch_add(1, Ordering::SeqCst);
    }

    pub fn scroll_attempted(&self) {
        self.scroll_attempts.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_raw_items(&self, count: usize) {
        self.raw_items_extracted
            .fetch_add(count as u64, Ordering::SeqCst);
    }

    /// Record the size of the filtered set
    ///
    /// Uses `fetch_max` so a late or repeated call can never move the
    /// counter backwards.
    pub fn set_filtered_items(&self, count: usize) {
        self.filtered_items.fetch_max(count as u64, Ordering::SeqCst);
    }

    pub fn add_cybersecurity_articles(&self, count: usize) {
        self.cybersecurity_articles
            .fetch_add(count as u64, Ordering::SeqCst);
    }

    #[must_use]
    pub fn successful_pages(&self) -> u64 {
        self.successful_pages.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn snapshot(&self) -> CrawlStats {
        CrawlStats {
            total_pages: self.total_pages.load(Ordering::SeqCst),
            successful_pages: self.successful_pages.load(Ordering::SeqCst),
            failed_pages: self.failed_pages.load(Ordering::SeqCst),
            screenshots_taken: self.screenshots_taken.load(Ordering::SeqCst),
            scroll_attempts: self.scroll_attempts.load(Ordering::SeqCst),
            raw_items_extracted: self.raw_items_extracted.load(Ordering::SeqCst),
            filtered_items: self.filtered_items.load(Ordering::SeqCst),
            cybersecurity_articles: self.cybersecurity_articles.load(Ordering::SeqCst),
        }
    }
}
