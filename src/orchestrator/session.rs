//! State owned by one crawl invocation

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::cancel::CancelFlag;
use crate::config::CrawlConfig;
use crate::crawl_events::{LogEntry, ProgressBroadcaster, SessionReporter};
use crate::model::{
    CrawlPhase, CrawlStats, FilteredContentItem, ProcessedArticle, RawContentItem, StatsTracker,
};
use crate::screenshot_store::ScreenshotStore;

/// Point-in-time view of a session for observers that attach late
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub phase: CrawlPhase,
    pub stats: CrawlStats,
    pub logs: Vec<LogEntry>,
    pub screenshot_ids: Vec<String>,
    pub raw_items: usize,
    pub filtered_items: usize,
    pub processed_items: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CrawlSession {
    id: Uuid,
    urls: Vec<String>,
    config: Arc<CrawlConfig>,
    cancel: CancelFlag,
    phase: Mutex<CrawlPhase>,
    reporter: Arc<SessionReporter>,
    screenshots: Arc<ScreenshotStore>,
    raw_items: Mutex<Vec<RawContentItem>>,
    filtered_items: Mutex<Vec<FilteredContentItem>>,
    processed_items: Mutex<Vec<ProcessedArticle>>,
    started_at: DateTime<Utc>,
    finished_at: Mutex<Option<Instant>>,
}

impl CrawlSession {
    /// Create an idle session; spawns the screenshot sweep task
    #[must_use]
    pub fn new(urls: Vec<String>, config: CrawlConfig) -> Self {
        let id = Uuid::new_v4();
        let events = Arc::new(ProgressBroadcaster::new(id));
        let reporter = Arc::new(SessionReporter::new(events, Arc::new(StatsTracker::new())));
        let screenshots = Arc::new(ScreenshotStore::new(
            config.screenshot_ttl(),
            config.screenshot_sweep_interval(),
        ));
        Self {
            id,
            urls,
            config: Arc::new(config),
            cancel: CancelFlag::new(),
            phase: Mutex::new(CrawlPhase::Idle),
            reporter,
            screenshots,
            raw_items: Mutex::new(Vec::new()),
            filtered_items: Mutex::new(Vec::new()),
            processed_items: Mutex::new(Vec::new()),
            started_at: Utc::now(),
            finished_at: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    #[must_use]
    pub fn config(&self) -> &Arc<CrawlConfig> {
        &self.config
    }

    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    #[must_use]
    pub fn phase(&self) -> CrawlPhase {
        *self.phase.lock()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    /// Move to `next` if the state machine allows it
    pub fn set_phase(&self, next: CrawlPhase) -> bool {
        let mut phase = self.phase.lock();
        if !phase.can_transition_to(next) {
            log::debug!(
                "Session {}: ignoring transition {} -> {}",
                self.id,
                phase.as_str(),
                next.as_str()
            );
            return false;
        }
        log::debug!("Session {}: {} -> {}", self.id, phase.as_str(), next.as_str());
        *phase = next;
        if next.is_terminal() {
            *self.finished_at.lock() = Some(Instant::now());
        }
        true
    }

    /// When the session reached a terminal phase
    #[must_use]
    pub fn finished_at(&self) -> Option<Instant> {
        *self.finished_at.lock()
    }

    #[must_use]
    pub fn reporter(&self) -> &Arc<SessionReporter> {
        &self.reporter
    }

    #[must_use]
    pub fn events(&self) -> &Arc<ProgressBroadcaster> {
        self.reporter.events()
    }

    #[must_use]
    pub fn stats(&self) -> &Arc<StatsTracker> {
        self.reporter.stats()
    }

    #[must_use]
    pub fn screenshots(&self) -> &Arc<ScreenshotStore> {
        &self.screenshots
    }

    pub(crate) fn set_raw_items(&self, items: Vec<RawContentItem>) {
        *self.raw_items.lock() = items;
    }

    pub(crate) fn set_filtered_items(&self, items: Vec<FilteredContentItem>) {
        *self.filtered_items.lock() = items;
    }

    pub(crate) fn push_processed(&self, articles: impl IntoIterator<Item = ProcessedArticle>) {
        self.processed_items.lock().extend(articles);
    }

    #[must_use]
    pub fn raw_items(&self) -> Vec<RawContentItem> {
        self.raw_items.lock().clone()
    }

    #[must_use]
    pub fn filtered_items(&self) -> Vec<FilteredContentItem> {
        self.filtered_items.lock().clone()
    }

    #[must_use]
    pub fn processed_items(&self) -> Vec<ProcessedArticle> {
        self.processed_items.lock().clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            phase: self.phase(),
            stats: self.stats().snapshot(),
            logs: self.reporter.logs(),
            screenshot_ids: self.screenshots.ids(),
            raw_items: self.raw_items.lock().len(),
            filtered_items: self.filtered_items.lock().len(),
            processed_items: self.processed_items.lock().len(),
            started_at: self.started_at,
        }
    }
}

impl Drop for CrawlSession {
    fn drop(&mut self) {
        self.screenshots.shutdown();
    }
}
