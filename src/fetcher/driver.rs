//! Browser seams the fetcher drives
//!
//! The fetcher only sees these traits. Chromium implements them in
//! [`crate::browser`]; tests implement them in memory.

use anyhow::Result;
use async_trait::async_trait;

/// One open browser tab
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and wait until the document is ready
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Serialized DOM of the current document
    async fn html(&self) -> Result<String>;

    async fn scroll_height(&self) -> Result<u64>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Small randomized mouse and scroll activity
    async fn simulate_human(&self) -> Result<()>;

    /// JPEG capture of the viewport at `quality` (0-100)
    async fn screenshot(&self, quality: u8) -> Result<Vec<u8>>;

    async fn close(&self) -> Result<()>;
}

/// Hands out pages backed by the session pool
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn PageDriver>>;

    /// Release every browser resource; later `open_page` calls fail
    async fn shutdown(&self);
}
