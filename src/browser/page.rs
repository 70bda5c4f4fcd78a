//! Chromium-backed [`PageDriver`]

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::pool::{PoolOptions, SessionGuard, SessionPool};
use crate::config::CrawlConfig;
use crate::fetcher::{DriverFactory, PageDriver};
use crate::stealth::{self, StealthProfile};

const READY_STATE_SCRIPT: &str = r"
    (function() {
        return {
            readyState: document.readyState,
            bodyExists: document.body !== null
        };
    })()
";

const SCROLL_HEIGHT_SCRIPT: &str =
    "Math.max(document.body ? document.body.scrollHeight : 0, document.documentElement.scrollHeight)";

const SCROLL_TO_BOTTOM_SCRIPT: &str =
    "window.scrollTo(0, document.documentElement.scrollHeight); true";

/// Poll until `document.readyState === 'complete'`, giving up quietly after `max_wait`
async fn wait_for_page_load(page: &Page, max_wait: Duration) {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(100);

    while start.elapsed() < max_wait {
        match page.evaluate(READY_STATE_SCRIPT).await {
            Ok(result) => {
                if let Ok(value) = result.into_value::<serde_json::Value>() {
                    let complete = value.get("readyState").and_then(|v| v.as_str())
                        == Some("complete");
                    let body = value
                        .get("bodyExists")
                        .and_then(serde_json::Value::as_bool)
                        .unwrap_or(false);
                    if complete && body {
                        debug!("Page ready after {:.2}s", start.elapsed().as_secs_f64());
                        return;
                    }
                }
            }
            Err(e) => debug!("Failed to check readyState: {}, retrying", e),
        }
        tokio::time::sleep(poll_interval).await;
    }
    warn!(
        "Page not ready after {:.1}s, proceeding anyway",
        max_wait.as_secs_f64()
    );
}

/// Opens stealth-configured tabs on pooled browsers
pub struct ChromiumDriverFactory {
    pool: Arc<SessionPool>,
    stealth: StealthProfile,
    persist_cookies: bool,
    load_wait: Duration,
}

impl ChromiumDriverFactory {
    #[must_use]
    pub fn from_config(config: &CrawlConfig) -> Self {
        let stealth = StealthProfile::from_config(config);
        Self {
            pool: SessionPool::new(PoolOptions::from_config(config), stealth.clone()),
            stealth,
            persist_cookies: config.persist_cookies_per_session(),
            load_wait: config.navigation_timeout(),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.pool
    }
}

#[async_trait]
impl DriverFactory for ChromiumDriverFactory {
    async fn open_page(&self) -> Result<Box<dyn PageDriver>> {
        let session = self.pool.acquire().await?;
        let browser = session
            .browser()
            .context("Pooled browser was already released")?;
        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to create blank page")?;

        if !self.persist_cookies
            && let Err(e) = page.execute(ClearBrowserCookiesParams::default()).await
        {
            warn!("Failed to clear cookies: {}", e);
        }

        if self.stealth.enabled() {
            let user_agent = self.stealth.user_agent();
            let fingerprint = self.stealth.fingerprint(user_agent);
            if let Err(e) = stealth::inject(&page, &fingerprint, user_agent).await {
                warn!("Stealth injection failed, continuing without it: {}", e);
            }
        }

        Ok(Box::new(ChromiumPage {
            page,
            load_wait: self.load_wait,
            _session: session,
        }))
    }

    async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

/// A tab holding its pooled browser until dropped
struct ChromiumPage {
    page: Page,
    load_wait: Duration,
    _session: SessionGuard,
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        wait_for_page_load(&self.page, self.load_wait).await;
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .context("Failed to read page content")
    }

    async fn scroll_height(&self) -> Result<u64> {
        let height: f64 = self
            .page
            .evaluate(SCROLL_HEIGHT_SCRIPT)
            .await
            .context("Failed to read scroll height")?
            .into_value()?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM_SCRIPT)
            .await
            .context("Failed to scroll")?;
        Ok(())
    }

    async fn simulate_human(&self) -> Result<()> {
        let script = stealth::human_behavior_script();
        self.page
            .evaluate(script.as_str())
            .await
            .context("Failed to simulate interaction")?;
        Ok(())
    }

    async fn screenshot(&self, quality: u8) -> Result<Vec<u8>> {
        let params = CaptureScreenshotParams {
            quality: Some(i64::from(quality.min(100))),
            format: Some(CaptureScreenshotFormat::Jpeg),
            ..Default::default()
        };
        self.page
            .screenshot(params)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to capture screenshot: {e}"))
    }

    async fn close(&self) -> Result<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to close page: {e}"))
    }
}
