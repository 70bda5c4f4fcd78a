//! Core ProgressBroadcaster struct definition and constructors

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::crawl_events::config::EventBusConfig;
use crate::crawl_events::metrics::EventBusMetrics;
use crate::crawl_events::types::CrawlUpdate;

/// Per-session fan-out of [`CrawlUpdate`]s
#[derive(Debug)]
pub struct ProgressBroadcaster {
    pub(super) session_id: Uuid,
    pub(super) sender: broadcast::Sender<CrawlUpdate>,
    pub(super) config: Arc<EventBusConfig>,
    pub(super) metrics: EventBusMetrics,
    pub(super) sequence: AtomicU64,
    pub(super) terminal_sent: AtomicBool,
    /// Serializes the terminal check, sequence stamp and send
    pub(super) send_lock: Mutex<()>,
}

impl ProgressBroadcaster {
    #[must_use]
    pub fn new(session_id: Uuid) -> Self {
        Self::with_config(session_id, EventBusConfig::default())
    }

    #[must_use]
    pub fn with_config(session_id: Uuid, config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity.max(1));
        Self {
            session_id,
            sender,
            config: Arc::new(config),
            metrics: EventBusMetrics::new(),
            sequence: AtomicU64::new(0),
            terminal_sent: AtomicBool::new(false),
            send_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[must_use]
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &EventBusMetrics {
        &self.metrics
    }

    /// Whether `complete` or `error` has gone out
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.terminal_sent.load(Ordering::SeqCst)
    }
}
