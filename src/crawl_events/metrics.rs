use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Lock-free publish counters for one broadcaster.
///
/// All counters use `Ordering::SeqCst` so snapshot reads stay coherent.
#[derive(Debug, Clone, Default)]
pub struct EventBusMetrics {
    pub events_published: Arc<AtomicU64>,
    /// Published while nobody was subscribed
    pub events_unobserved: Arc<AtomicU64>,
    /// Rejected because the terminal event was already out
    pub events_suppressed: Arc<AtomicU64>,
    pub peak_subscribers: Arc<AtomicUsize>,
}

impl EventBusMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_published(&self) {
        self.events_published.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_unobserved(&self) {
        self.events_unobserved.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_suppressed(&self) {
        self.events_suppressed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn update_subscriber_count(&self, count: usize) {
        let _ = self.peak_subscribers.fetch_max(count, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_published: self.events_published.load(Ordering::SeqCst),
            events_unobserved: self.events_unobserved.load(Ordering::SeqCst),
            events_suppressed: self.events_suppressed.load(Ordering::SeqCst),
            peak_subscribers: self.peak_subscribers.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_published: u64,
    pub events_unobserved: u64,
    pub events_suppressed: u64,
    pub peak_subscribers: usize,
}
