//! Shared configuration constants for intelscrape
//!
//! Default values used by `CrawlConfig`, the fetcher and the session registry.
//! Keeping them here avoids magic numbers scattered through the pipeline.

/// Default number of seed URLs fetched in parallel
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Default number of browser sessions a single crawl may hold
pub const DEFAULT_MAX_SESSIONS_PER_CRAWLER: usize = 3;

/// Default hard cap on page navigations per crawl (initial + pagination)
pub const DEFAULT_MAX_REQUESTS_PER_CRAWL: usize = 100;

/// Default retry budget per page after the first attempt
pub const DEFAULT_MAX_REQUEST_RETRIES: u32 = 2;

/// Base delay for the exponential retry backoff
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Upper bound for a single retry backoff sleep
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Default per-page handler budget (navigation + scroll + extraction)
pub const DEFAULT_REQUEST_HANDLER_TIMEOUT_SECS: u64 = 60;

/// Default `page.goto()` timeout
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Default pagination depth
pub const DEFAULT_MAX_CRAWLING_DEPTH: usize = 3;

/// Default number of "next page" hops followed per seed URL
pub const DEFAULT_MAX_PAGINATION_PAGES: usize = 3;

/// Default infinite-scroll attempts per page
pub const DEFAULT_MAX_SCROLL_ATTEMPTS: u32 = 3;

/// Wait after each scroll for lazy content to arrive
pub const DEFAULT_SCROLL_WAIT_MS: u64 = 1000;

/// Screenshot quality: 80% JPEG compression
///
/// Roughly 50-100KB per capture, which keeps the in-memory screenshot store
/// small enough to hold a full crawl's worth of previews.
pub const SCREENSHOT_QUALITY: u8 = 80;

/// Default capture timeout for a single screenshot
pub const DEFAULT_SCREENSHOT_TIMEOUT_SECS: u64 = 10;

/// Screenshots older than this are evicted by the sweep task (5 minutes)
pub const DEFAULT_SCREENSHOT_TTL_SECS: u64 = 300;

/// Interval between screenshot eviction sweeps
pub const DEFAULT_SCREENSHOT_SWEEP_INTERVAL_SECS: u64 = 30;

/// Default number of fragments per AI classification request
pub const DEFAULT_AI_BATCH_SIZE: usize = 10;

/// Default number of AI classification requests per crawl
pub const DEFAULT_MAX_AI_BATCHES: usize = 5;

/// Default timeout for a single classification request
pub const DEFAULT_AI_BATCH_TIMEOUT_SECS: u64 = 120;

/// Fixed delay between requests when random delays are disabled
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;

/// Fixed delay between requests to the same domain (pagination hops)
pub const DEFAULT_SAME_DOMAIN_DELAY_MS: u64 = 2000;

/// Lower bound for randomized inter-request delays
pub const DEFAULT_MIN_DELAY_MS: u64 = 500;

/// Upper bound for randomized inter-request delays
pub const DEFAULT_MAX_DELAY_MS: u64 = 3000;

/// Fragments shorter than this (in characters) are dropped by the quality filter
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 20;

/// Capacity of the per-session progress channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Terminal sessions are kept in the registry this long for snapshot queries
pub const SESSION_RETENTION_SECS: u64 = 5 * 60;

/// Registry cleanup interval
pub const SESSION_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Message carried by the terminal event of a cancelled session
pub const CANCELLED_MESSAGE: &str = "Cancelled by user";

/// Desktop user agents used when user-agent rotation is enabled
///
/// Updated: 2025-01 to current stable desktop releases. Keep the set small and
/// realistic; exotic agents are themselves a bot signal.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.204 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.265 Safari/537.36 Edg/131.0.2903.146",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.2 Safari/605.1.15",
];

/// User agent used when rotation is disabled
pub const CHROME_USER_AGENT: &str = USER_AGENTS[0];

/// Selectors tried for a "next page" link after `rel=next`
pub const DEFAULT_NEXT_PAGE_SELECTORS: &[&str] = &[
    ".pagination .next a",
    ".pagination a.next",
    "a.next",
    "a.next-page",
    ".nav-previous a",
    "a[aria-label='Next page']",
];

/// Anchor texts treated as "next page" when no selector matches
pub const NEXT_PAGE_TEXTS: &[&str] = &["next", "next page", "older", "older posts", "more", "›", "»"];
