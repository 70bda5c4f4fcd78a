//! Chromium sessions: launch, profile directories, pooling and the page driver

mod launch;
mod page;
mod pool;
mod profile;

pub use launch::{LaunchOptions, download_managed_browser, find_browser_executable, launch_browser};
pub use page::ChromiumDriverFactory;
pub use pool::{PoolOptions, SessionGuard, SessionPool};
pub use profile::BrowserProfile;
