//! Core configuration types for a crawl session
//!
//! `CrawlConfig` is immutable once a session starts. It is built through
//! [`CrawlConfig::builder`] or deserialized from camelCase JSON, and in both
//! cases validated before use.

use serde::{Deserialize, Serialize};

use crate::utils::constants::*;

/// CSS selectors per extraction rule kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionRules {
    pub article: Vec<String>,
    pub headline: Vec<String>,
    pub link: Vec<String>,
    pub clickable: Vec<String>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        let owned = |s: &[&str]| s.iter().map(|s| (*s).to_string()).collect();
        Self {
            article: owned(&[
                "article",
                ".article",
                ".post",
                ".news-item",
                ".entry",
                "[class*='article-card']",
            ]),
            headline: owned(&["h1 a", "h2 a", "h3 a", ".headline a", ".title a"]),
            link: owned(&[
                "a[href*='/news/']",
                "a[href*='/article']",
                "a[href*='/blog/']",
                "a[href*='/security']",
                "a[href*='/threat']",
            ]),
            clickable: owned(&["[data-href]", "[data-url]", ".card[onclick]"]),
        }
    }
}

/// Main configuration struct for a crawl session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrawlConfig {
    // Parallelism
    pub(crate) max_concurrency: usize,
    pub(crate) max_sessions_per_crawler: usize,
    pub(crate) persist_cookies_per_session: bool,

    // Budgets and retry
    pub(crate) max_requests_per_crawl: usize,
    pub(crate) max_request_retries: u32,
    pub(crate) retry_base_delay_ms: u64,
    pub(crate) request_handler_timeout_secs: u64,
    pub(crate) navigation_timeout_secs: u64,

    // Pagination and scroll
    pub(crate) max_crawling_depth: usize,
    pub(crate) max_pagination_pages: usize,
    pub(crate) max_scroll_attempts: u32,
    pub(crate) scroll_wait_ms: u64,

    // Screenshots
    pub(crate) enable_screenshots: bool,
    pub(crate) screenshot_quality: u8,
    pub(crate) screenshot_timeout_secs: u64,
    pub(crate) screenshot_ttl_secs: u64,
    pub(crate) screenshot_sweep_interval_secs: u64,

    // Classification
    #[serde(rename = "enableAIProcessing")]
    pub(crate) enable_ai_processing: bool,
    pub(crate) ai_batch_size: usize,
    pub(crate) max_ai_batches: usize,
    pub(crate) ai_batch_timeout_secs: u64,

    // Stealth
    pub(crate) stealth_mode: bool,
    pub(crate) bot_detection_bypass: bool,
    pub(crate) random_delays: bool,
    pub(crate) rotate_user_agents: bool,
    pub(crate) human_behavior: bool,
    pub(crate) request_delay_ms: u64,
    pub(crate) same_domain_delay_ms: u64,
    pub(crate) min_delay_ms: u64,
    pub(crate) max_delay_ms: u64,
    pub(crate) headless: bool,

    // Extraction and filtering
    pub(crate) min_content_length: usize,
    pub(crate) extraction_rules: ExtractionRules,
    pub(crate) next_page_selectors: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_sessions_per_crawler: DEFAULT_MAX_SESSIONS_PER_CRAWLER,
            persist_cookies_per_session: true,
            max_requests_per_crawl: DEFAULT_MAX_REQUESTS_PER_CRAWL,
            max_request_retries: DEFAULT_MAX_REQUEST_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            request_handler_timeout_secs: DEFAULT_REQUEST_HANDLER_TIMEOUT_SECS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            max_crawling_depth: DEFAULT_MAX_CRAWLING_DEPTH,
            max_pagination_pages: DEFAULT_MAX_PAGINATION_PAGES,
            max_scroll_attempts: DEFAULT_MAX_SCROLL_ATTEMPTS,
            scroll_wait_ms: DEFAULT_SCROLL_WAIT_MS,
            enable_screenshots: true,
            screenshot_quality: SCREENSHOT_QUALITY,
            screenshot_timeout_secs: DEFAULT_SCREENSHOT_TIMEOUT_SECS,
            screenshot_ttl_secs: DEFAULT_SCREENSHOT_TTL_SECS,
            screenshot_sweep_interval_secs: DEFAULT_SCREENSHOT_SWEEP_INTERVAL_SECS,
            enable_ai_processing: true,
            ai_batch_size: DEFAULT_AI_BATCH_SIZE,
            max_ai_batches: DEFAULT_MAX_AI_BATCHES,
            ai_batch_timeout_secs: DEFAULT_AI_BATCH_TIMEOUT_SECS,
            stealth_mode: true,
            bot_detection_bypass: true,
            random_delays: true,
            rotate_user_agents: true,
            human_behavior: true,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            same_domain_delay_ms: DEFAULT_SAME_DOMAIN_DELAY_MS,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            headless: true,
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            extraction_rules: ExtractionRules::default(),
            next_page_selectors: DEFAULT_NEXT_PAGE_SELECTORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}
