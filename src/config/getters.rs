//! Accessors for `CrawlConfig`

use std::time::Duration;

use super::types::{CrawlConfig, ExtractionRules};

macro_rules! getters {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[must_use]
            pub fn $name(&self) -> $ty {
                self.$name
            }
        )*
    };
}

impl CrawlConfig {
    getters! {
        max_concurrency: usize,
        max_sessions_per_crawler: usize,
        persist_cookies_per_session: bool,
        max_requests_per_crawl: usize,
        max_request_retries: u32,
        max_crawling_depth: usize,
        max_pagination_pages: usize,
        max_scroll_attempts: u32,
        enable_screenshots: bool,
        screenshot_quality: u8,
        enable_ai_processing: bool,
        ai_batch_size: usize,
        max_ai_batches: usize,
        stealth_mode: bool,
        bot_detection_bypass: bool,
        random_delays: bool,
        rotate_user_agents: bool,
        human_behavior: bool,
        headless: bool,
        min_content_length: usize,
    }

    #[must_use]
    pub fn extraction_rules(&self) -> &ExtractionRules {
        &self.extraction_rules
    }

    #[must_use]
    pub fn next_page_selectors(&self) -> &[String] {
        &self.next_page_selectors
    }

    /// Browser sessions the pool may hold at once
    #[must_use]
    pub fn effective_pool_size(&self) -> usize {
        self.max_sessions_per_crawler.min(self.max_concurrency).max(1)
    }

    /// Pages fetched per seed URL, counting the seed page itself
    #[must_use]
    pub fn effective_page_limit(&self) -> usize {
        self.max_pagination_pages.min(self.max_crawling_depth).max(1)
    }

    /// Whether any stealth countermeasure beyond plain browsing is active
    #[must_use]
    pub fn stealth_enabled(&self) -> bool {
        self.stealth_mode || self.bot_detection_bypass
    }

    /// Most items sent to the classifier in one session
    #[must_use]
    pub fn ai_item_cap(&self) -> usize {
        self.ai_batch_size.saturating_mul(self.max_ai_batches)
    }

    #[must_use]
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    #[must_use]
    pub fn request_handler_timeout(&self) -> Duration {
        Duration::from_secs(self.request_handler_timeout_secs)
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn scroll_wait(&self) -> Duration {
        Duration::from_millis(self.scroll_wait_ms)
    }

    #[must_use]
    pub fn screenshot_timeout(&self) -> Duration {
        Duration::from_secs(self.screenshot_timeout_secs)
    }

    #[must_use]
    pub fn screenshot_ttl(&self) -> Duration {
        Duration::from_secs(self.screenshot_ttl_secs)
    }

    #[must_use]
    pub fn screenshot_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.screenshot_sweep_interval_secs)
    }

    #[must_use]
    pub fn ai_batch_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_batch_timeout_secs)
    }

    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    #[must_use]
    pub fn same_domain_delay(&self) -> Duration {
        Duration::from_millis(self.same_domain_delay_ms)
    }

    /// Bounds for randomized delays as `(min, max)`
    #[must_use]
    pub fn delay_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}
