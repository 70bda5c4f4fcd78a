//! Page fetching: navigation with retry, pagination, infinite scroll and
//! screenshot capture for one seed URL at a time

mod budget;
mod driver;
mod retry;
mod timeout;

pub use budget::RequestBudget;
pub use driver::{DriverFactory, PageDriver};
pub use retry::{FailureKind, backoff_delay};
pub use timeout::with_page_timeout;

use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::config::CrawlConfig;
use crate::crawl_events::{LogLevel, SessionReporter};
use crate::errors::NavigationError;
use crate::extractor::{ContentExtractor, PageContext};
use crate::model::{RawContentItem, StatsTracker};
use crate::screenshot_store::ScreenshotStore;
use crate::stealth::StealthProfile;
use crate::utils::canonicalize_url;

/// What fetching one seed URL (and its pagination chain) produced
#[derive(Debug, Default)]
pub struct UrlOutcome {
    pub items: Vec<RawContentItem>,
    pub pages_succeeded: u64,
    pub pages_failed: u64,
}

enum Navigated {
    Loaded,
    Cancelled,
}

/// Fetches pages for a session; shared by all of its fetch workers
pub struct PageFetcher {
    config: Arc<CrawlConfig>,
    extractor: Arc<ContentExtractor>,
    stealth: StealthProfile,
    budget: RequestBudget,
    reporter: Arc<SessionReporter>,
    screenshots: Arc<ScreenshotStore>,
    cancel: CancelFlag,
}

impl PageFetcher {
    #[must_use]
    pub fn new(
        config: Arc<CrawlConfig>,
        extractor: Arc<ContentExtractor>,
        reporter: Arc<SessionReporter>,
        screenshots: Arc<ScreenshotStore>,
        cancel: CancelFlag,
    ) -> Self {
        let stealth = StealthProfile::from_config(&config);
        let budget = RequestBudget::new(config.max_requests_per_crawl());
        Self {
            config,
            extractor,
            stealth,
            budget,
            reporter,
            screenshots,
            cancel,
        }
    }

    #[must_use]
    pub fn budget(&self) -> &RequestBudget {
        &self.budget
    }

    fn stats(&self) -> &StatsTracker {
        self.reporter.stats()
    }

    /// Fetch `seed_url` and follow its "next page" links
    ///
    /// Page failures are counted and logged, never returned. The chain stops at
    /// the page limit, a missing or already visited next link, an exhausted
    /// request budget, or cancellation.
    pub async fn fetch_url(
        &self,
        seed_url: &str,
        driver: &dyn PageDriver,
        position: usize,
        total: usize,
    ) -> UrlOutcome {
        let mut outcome = UrlOutcome::default();
        let mut visited = HashSet::new();
        let page_limit = self.config.effective_page_limit();
        let mut page_number = 0usize;
        let mut next = Some(seed_url.to_string());

        while let Some(page_url) = next.take() {
            if self.cancel.is_cancelled() || page_number >= page_limit {
                break;
            }
            if !visited.insert(canonicalize_url(&page_url)) {
                log::debug!("Pagination loop detected at {page_url}");
                break;
            }
            let Some(request_number) = self.budget.try_reserve() else {
                if self.budget.mark_exhausted() {
                    self.reporter.warn(format!(
                        "Request budget of {} pages exhausted; skipping remaining pages",
                        self.budget.limit()
                    ));
                }
                break;
            };
            page_number += 1;

            if self.stealth.enabled()
                && request_number > 1
                && !self.cancel.sleep(self.stealth.delay(page_number > 1)).await
            {
                break;
            }

            self.stats().page_attempted();
            self.reporter.page_progress(&page_url, position, total);

            match self.navigate(driver, &page_url).await {
                Ok(Navigated::Loaded) => {}
                Ok(Navigated::Cancelled) => break,
                Err(e) => {
                    self.stats().page_failed();
                    outcome.pages_failed += 1;
                    self.reporter.warn(format!("Page skipped: {e}"));
                    self.reporter.emit_stats();
                    break;
                }
            }

            let handled = with_page_timeout(
                self.process_page(driver, &page_url),
                self.config.request_handler_timeout(),
                "Page handler",
            )
            .await;

            match handled {
                Ok(html) => {
                    self.stats().page_succeeded();
                    outcome.pages_succeeded += 1;

                    let items = self.extractor.extract(
                        &html,
                        PageContext {
                            seed_url,
                            page_url: &page_url,
                            page_number,
                        },
                    );
                    self.stats().add_raw_items(items.len());
                    self.reporter.info(format!(
                        "Extracted {} items from {page_url} (page {page_number})",
                        items.len()
                    ));
                    outcome.items.extend(items);
                    next = self.extractor.next_page_url(&html, &page_url);
                }
                Err(e) => {
                    self.stats().page_failed();
                    outcome.pages_failed += 1;
                    self.reporter
                        .warn(format!("Page skipped: {page_url} could not be processed: {e:#}"));
                }
            }
            self.reporter.emit_stats();
        }

        outcome
    }

    /// Navigate with retry and backoff; cancellation interrupts both
    async fn navigate(
        &self,
        driver: &dyn PageDriver,
        url: &str,
    ) -> Result<Navigated, NavigationError> {
        let max_attempts = self.config.max_request_retries().saturating_add(1);
        let timeout = self.config.navigation_timeout();
        let mut attempts = 0;
        let mut last_error = String::new();

        while attempts < max_attempts {
            attempts += 1;
            let result = tokio::select! {
                r = tokio::time::timeout(timeout, driver.navigate(url)) => r,
                () = self.cancel.cancelled() => return Ok(Navigated::Cancelled),
            };
            // Classify the driver's own message; the URL must not sway the verdict
            let (error, kind) = match result {
                Ok(Ok(())) => return Ok(Navigated::Loaded),
                Ok(Err(e)) => {
                    let message = format!("{e:#}");
                    let kind = FailureKind::classify(&message);
                    (
                        NavigationError::Transport {
                            url: url.to_string(),
                            message,
                        },
                        kind,
                    )
                }
                Err(_) => (
                    NavigationError::Timeout {
                        url: url.to_string(),
                        timeout,
                    },
                    FailureKind::Network,
                ),
            };
            last_error = error.to_string();

            if attempts == max_attempts || !kind.is_retryable() {
                break;
            }
            let delay = backoff_delay(self.config.retry_base_delay(), attempts, kind);
            self.reporter.log(
                LogLevel::Debug,
                format!(
                    "Attempt {attempts}/{max_attempts} failed ({kind:?}): {last_error}; retrying in {delay:?}"
                ),
            );
            if !self.cancel.sleep(delay).await {
                return Ok(Navigated::Cancelled);
            }
        }

        Err(NavigationError::RetriesExhausted {
            url: url.to_string(),
            attempts,
            last_error,
        })
    }

    /// Everything after a successful navigation; yields the final HTML
    async fn process_page(&self, driver: &dyn PageDriver, url: &str) -> Result<String> {
        if self.stealth.human_behavior()
            && let Err(e) = driver.simulate_human().await
        {
            log::debug!("Human behaviour simulation failed on {url}: {e}");
        }

        if let Err(e) = self.scroll(driver).await {
            log::debug!("Stopped scrolling {url}: {e}");
        }

        if self.config.enable_screenshots() {
            self.capture_screenshot(driver, url).await;
        }

        driver.html().await
    }

    /// Scroll until the page stops growing or the attempt budget is spent
    async fn scroll(&self, driver: &dyn PageDriver) -> Result<()> {
        let mut last_height = driver.scroll_height().await?;
        for _ in 0..self.config.max_scroll_attempts() {
            if self.cancel.is_cancelled() {
                break;
            }
            driver.scroll_to_bottom().await?;
            self.stats().scroll_attempted();
            if !self.cancel.sleep(self.config.scroll_wait()).await {
                break;
            }
            let height = driver.scroll_height().await?;
            if height == last_height {
                break;
            }
            last_height = height;
        }
        Ok(())
    }

    async fn capture_screenshot(&self, driver: &dyn PageDriver, url: &str) {
        let captured = with_page_timeout(
            driver.screenshot(self.config.screenshot_quality()),
            self.config.screenshot_timeout(),
            "Screenshot",
        )
        .await;

        match captured {
            Ok(data) => {
                let id = self.screenshots.insert(url, data.clone());
                self.stats().screenshot_taken();
                self.reporter.screenshot(&id, url, &data);
            }
            Err(e) => self
                .reporter
                .warn(format!("Screenshot failed for {url}: {e:#}")),
        }
    }
}
