//! Bounded pool of Chromium sessions
//!
//! Browsers are launched lazily, at most `size` at a time, and handed out
//! behind a [`SessionGuard`] that returns them on drop.

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::launch::{LaunchOptions, launch_browser};
use super::profile::BrowserProfile;
use crate::config::CrawlConfig;
use crate::stealth::StealthProfile;

const PROFILE_PREFIX: &str = "intelscrape_chrome";

#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub size: usize,
    pub headless: bool,
}

impl PoolOptions {
    #[must_use]
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            size: config.effective_pool_size(),
            headless: config.headless(),
        }
    }
}

/// A launched browser together with everything that must die with it
#[derive(Debug)]
struct PooledBrowser {
    id: u64,
    browser: Browser,
    handler: JoinHandle<()>,
    // dropped after the handler is aborted, removing the directory
    _profile: BrowserProfile,
}

impl Drop for PooledBrowser {
    fn drop(&mut self) {
        debug!("Dropping pooled browser {}", self.id);
        self.handler.abort();
    }
}

#[derive(Debug)]
pub struct SessionPool {
    options: PoolOptions,
    stealth: StealthProfile,
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<PooledBrowser>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl SessionPool {
    #[must_use]
    pub fn new(options: PoolOptions, stealth: StealthProfile) -> Arc<Self> {
        let size = options.size.max(1);
        Arc::new(Self {
            options,
            stealth,
            permits: Arc::new(Semaphore::new(size)),
            idle: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Wait for a free session, launching a browser if none is idle
    pub async fn acquire(self: &Arc<Self>) -> Result<SessionGuard> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| anyhow::anyhow!("Session pool is shut down"))?;

        let reused = self.idle.lock().pop();
        let browser = match reused {
            Some(browser) => {
                debug!("Reusing pooled browser {}", browser.id);
                browser
            }
            None => self.launch().await?,
        };

        Ok(SessionGuard {
            browser: Some(browser),
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    async fn launch(&self) -> Result<PooledBrowser> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let profile = BrowserProfile::create(PROFILE_PREFIX)
            .context("Failed to create browser profile")?;

        let options = LaunchOptions {
            headless: self.options.headless,
            user_data_dir: profile.path().to_path_buf(),
            user_agent: self.stealth.user_agent().to_string(),
            stealth: self.stealth.enabled(),
        };
        let (browser, handler) = launch_browser(&options)
            .await
            .context("Failed to launch pooled browser")?;

        info!("Launched pooled browser {} ({})", id, profile.path().display());
        Ok(PooledBrowser {
            id,
            browser,
            handler,
            _profile: profile,
        })
    }

    fn release(&self, browser: PooledBrowser) {
        if self.closed.load(Ordering::SeqCst) {
            drop(browser);
        } else {
            self.idle.lock().push(browser);
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close every idle browser and refuse further acquisitions
    ///
    /// Browsers still checked out are torn down when their guard drops.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.permits.close();

        let drained = std::mem::take(&mut *self.idle.lock());
        for mut pooled in drained {
            if let Err(e) = pooled.browser.close().await {
                warn!("Failed to close browser {}: {}", pooled.id, e);
            }
            if let Err(e) = pooled.browser.wait().await {
                warn!("Failed to reap browser {}: {}", pooled.id, e);
            }
        }
        info!("Session pool shut down");
    }
}

/// Exclusive use of one pooled browser
#[derive(Debug)]
pub struct SessionGuard {
    browser: Option<PooledBrowser>,
    pool: Arc<SessionPool>,
    _permit: OwnedSemaphorePermit,
}

impl SessionGuard {
    #[must_use]
    pub fn browser(&self) -> Option<&Browser> {
        self.browser.as_ref().map(|pooled| &pooled.browser)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(browser) = self.browser.take() {
            self.pool.release(browser);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Arc<SessionPool> {
        let config = CrawlConfig::builder().stealth(false).build().unwrap();
        SessionPool::new(
            PoolOptions::from_config(&config),
            StealthProfile::from_config(&config),
        )
    }

    #[tokio::test]
    async fn shutdown_rejects_new_sessions() {
        let pool = pool();
        pool.shutdown().await;
        assert!(pool.is_closed());
        let err = pool.acquire().await.unwrap_err();
        assert!(err.to_string().contains("shut down"));
        // idempotent
        pool.shutdown().await;
    }

    #[test]
    fn pool_size_follows_effective_limit() {
        let config = CrawlConfig::builder()
            .max_concurrency(2)
            .max_sessions_per_crawler(5)
            .build()
            .unwrap();
        assert_eq!(PoolOptions::from_config(&config).size, 2);
    }
}
