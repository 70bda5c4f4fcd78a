//! Fluent builder for `CrawlConfig`
//!
//! Every field has a default, so the builder has no required steps;
//! `build()` runs the same validation as file loading.

use crate::errors::InvalidInputError;

use super::types::{CrawlConfig, ExtractionRules};

#[derive(Debug, Clone, Default)]
pub struct CrawlConfigBuilder {
    pub(crate) config: CrawlConfig,
}

impl CrawlConfig {
    /// Create a builder starting from the defaults
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder::default()
    }

    /// Continue building from an existing configuration
    #[must_use]
    pub fn to_builder(&self) -> CrawlConfigBuilder {
        CrawlConfigBuilder {
            config: self.clone(),
        }
    }
}

macro_rules! setters {
    ($($(#[$meta:meta])* $name:ident: $ty:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(mut self, value: $ty) -> Self {
                self.config.$name = value;
                self
            }
        )*
    };
}

impl CrawlConfigBuilder {
    setters! {
        /// Upper bound on URLs fetched in parallel
        max_concurrency: usize,
        /// Upper bound on browser sessions in the pool
        max_sessions_per_crawler: usize,
        persist_cookies_per_session: bool,
        /// Hard cap on page navigations across every URL of the session
        max_requests_per_crawl: usize,
        max_request_retries: u32,
        retry_base_delay_ms: u64,
        request_handler_timeout_secs: u64,
        navigation_timeout_secs: u64,
        max_crawling_depth: usize,
        max_pagination_pages: usize,
        max_scroll_attempts: u32,
        scroll_wait_ms: u64,
        enable_screenshots: bool,
        screenshot_quality: u8,
        screenshot_timeout_secs: u64,
        screenshot_ttl_secs: u64,
        screenshot_sweep_interval_secs: u64,
        enable_ai_processing: bool,
        ai_batch_size: usize,
        max_ai_batches: usize,
        ai_batch_timeout_secs: u64,
        stealth_mode: bool,
        bot_detection_bypass: bool,
        random_delays: bool,
        rotate_user_agents: bool,
        human_behavior: bool,
        request_delay_ms: u64,
        same_domain_delay_ms: u64,
        min_delay_ms: u64,
        max_delay_ms: u64,
        headless: bool,
        min_content_length: usize,
        extraction_rules: ExtractionRules,
    }

    #[must_use]
    pub fn next_page_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.next_page_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    /// Turn every bot-detection countermeasure on or off at once
    #[must_use]
    pub fn stealth(mut self, enabled: bool) -> Self {
        let c = &mut self.config;
        c.stealth_mode = enabled;
        c.bot_detection_bypass = enabled;
        c.random_delays = enabled;
        c.rotate_user_agents = enabled;
        c.human_behavior = enabled;
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> Result<CrawlConfig, InvalidInputError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
