//! Session-facing reporting: the ordered log, stats and progress updates
//!
//! Workers never touch the broadcaster directly; they go through a
//! `SessionReporter`, which records log lines in the session history, mirrors
//! them to the `log` facade and publishes the matching updates.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::model::{CrawlPhase, StatsTracker};

use super::bus::ProgressBroadcaster;
use super::types::{CrawlEvent, LogEntry, LogLevel, ProgressPayload, ScreenshotPayload};

#[derive(Debug)]
pub struct SessionReporter {
    events: Arc<ProgressBroadcaster>,
    stats: Arc<StatsTracker>,
    logs: Mutex<Vec<LogEntry>>,
}

impl SessionReporter {
    #[must_use]
    pub fn new(events: Arc<ProgressBroadcaster>, stats: Arc<StatsTracker>) -> Self {
        Self {
            events,
            stats,
            logs: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn events(&self) -> &Arc<ProgressBroadcaster> {
        &self.events
    }

    #[must_use]
    pub fn stats(&self) -> &Arc<StatsTracker> {
        &self.stats
    }

    /// Record a session log line and publish it
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message);
        match level {
            LogLevel::Debug => log::debug!("{}", entry.message),
            LogLevel::Info => log::info!("{}", entry.message),
            LogLevel::Warning => log::warn!("{}", entry.message),
            LogLevel::Error => log::error!("{}", entry.message),
        }
        self.logs.lock().push(entry.clone());
        self.events.emit(CrawlEvent::Log(entry));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    /// Publish a stats snapshot taken under the send lock
    pub fn emit_stats(&self) {
        let stats = Arc::clone(&self.stats);
        if let Err(e) = self
            .events
            .publish_with(move || CrawlEvent::Stats(stats.snapshot()))
        {
            log::debug!("Stats update not published: {e}");
        }
    }

    pub fn progress(&self, phase: CrawlPhase, message: impl Into<String>) {
        self.events.emit(CrawlEvent::progress(phase, message));
    }

    /// Progress for a page fetch within the crawling phase
    pub fn page_progress(&self, url: &str, completed: usize, total: usize) {
        self.events.emit(CrawlEvent::Progress(ProgressPayload {
            phase: CrawlPhase::Crawling,
            message: format!("Fetching {url}"),
            current_url: Some(url.to_string()),
            completed: Some(completed),
            total: Some(total),
        }));
    }

    /// Announce a stored screenshot
    pub fn screenshot(&self, id: &str, url: &str, data: &[u8]) {
        self.events.emit(CrawlEvent::Screenshot(ScreenshotPayload {
            id: id.to_string(),
            url: url.to_string(),
            size: data.len(),
            data: BASE64.encode(data),
            timestamp: Utc::now(),
        }));
    }

    /// Ordered copy of the session log
    #[must_use]
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn log_lines_are_recorded_and_published() {
        let events = Arc::new(ProgressBroadcaster::new(Uuid::new_v4()));
        let mut rx = events.subscribe();
        let reporter = SessionReporter::new(events, Arc::new(StatsTracker::new()));

        reporter.warn("page failed");
        reporter.info("continuing");

        let logs = reporter.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, LogLevel::Warning);

        match rx.try_recv().unwrap().event {
            CrawlEvent::Log(entry) => assert_eq!(entry.message, "page failed"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn screenshot_payload_is_base64() {
        let events = Arc::new(ProgressBroadcaster::new(Uuid::new_v4()));
        let mut rx = events.subscribe();
        let reporter = SessionReporter::new(events, Arc::new(StatsTracker::new()));

        reporter.screenshot("id-1", "https://a.test/", b"jpeg");
        match rx.try_recv().unwrap().event {
            CrawlEvent::Screenshot(shot) => {
                assert_eq!(shot.size, 4);
                assert_eq!(shot.data, "anBlZw==");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
