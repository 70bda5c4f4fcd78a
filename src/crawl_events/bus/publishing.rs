//! Publishing operations for the ProgressBroadcaster

use chrono::Utc;
use std::sync::atomic::Ordering;

use crate::crawl_events::errors::EventBusError;
use crate::crawl_events::types::{CrawlEvent, CrawlUpdate};

use super::core::ProgressBroadcaster;

impl ProgressBroadcaster {
    /// Publish an event to every current subscriber
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of subscribers that received the update (may be 0)
    /// * `Err(EventBusError::TerminalSent)` - The session already ended; the
    ///   event was discarded
    pub fn publish(&self, event: CrawlEvent) -> Result<usize, EventBusError> {
        self.publish_with(move || event)
    }

    /// Build and publish an event while holding the send lock
    ///
    /// Snapshots taken inside `build` are ordered exactly like the published
    /// updates, so monotonic counters stay monotonic on the wire.
    pub fn publish_with<F>(&self, build: F) -> Result<usize, EventBusError>
    where
        F: FnOnce() -> CrawlEvent,
    {
        let _guard = self.send_lock.lock();

        if self.terminal_sent.load(Ordering::SeqCst) {
            if self.config.enable_metrics {
                self.metrics.increment_suppressed();
            }
            log::debug!("Dropping event for finished session {}", self.session_id);
            return Err(EventBusError::TerminalSent);
        }

        let event = build();

        if event.is_terminal() {
            self.terminal_sent.store(true, Ordering::SeqCst);
        }

        let update = CrawlUpdate {
            session_id: self.session_id,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            event,
        };

        // SendError only means nobody is listening right now
        let delivered = self.sender.send(update).unwrap_or(0);
        if self.config.enable_metrics {
            self.metrics.increment_published();
            self.metrics.update_subscriber_count(delivered);
            if delivered == 0 {
                self.metrics.increment_unobserved();
            }
        }
        Ok(delivered)
    }

    /// Publish, logging instead of failing when the session already ended
    pub fn emit(&self, event: CrawlEvent) {
        if let Err(e) = self.publish(event) {
            log::debug!("Progress event not published: {e}");
        }
    }
}
