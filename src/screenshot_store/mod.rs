//! TTL-evicting store for captured page screenshots
//!
//! Entries are keyed by an opaque id. A background sweep owned by the store
//! removes entries older than the TTL on a fixed interval; the sweep keeps
//! running regardless of crawl phase and stops when the store is shut down or
//! dropped.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// One captured image
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub id: String,
    pub url: String,
    /// Encoded image bytes (JPEG)
    pub data: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub size: usize,
    captured_at: Instant,
}

impl Screenshot {
    #[must_use]
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }
}

type Entries = DashMap<String, Screenshot>;

#[derive(Debug)]
pub struct ScreenshotStore {
    entries: Arc<Entries>,
    ttl: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl ScreenshotStore {
    /// Create a store and start its sweep task
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        let entries = Arc::new(Entries::new());
        let sweeper = spawn_sweeper(Arc::downgrade(&entries), ttl, sweep_interval);
        Self {
            entries,
            ttl,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    /// Store a capture and return its id
    pub fn insert(&self, url: impl Into<String>, data: Vec<u8>) -> String {
        let id = Uuid::new_v4().to_string();
        let size = data.len();
        self.entries.insert(
            id.clone(),
            Screenshot {
                id: id.clone(),
                url: url.into(),
                data,
                timestamp: Utc::now(),
                size,
                captured_at: Instant::now(),
            },
        );
        id
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Screenshot> {
        self.entries
            .get(id)
            .filter(|entry| entry.age() < self.ttl)
            .map(|entry| entry.value().clone())
    }

    pub fn delete(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Ids currently held, including expired entries awaiting the next sweep
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries now; returns how many were evicted
    pub fn sweep_expired(&self) -> usize {
        sweep(&self.entries, self.ttl)
    }

    /// Stop the background sweep; stored entries stay readable
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for ScreenshotStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sweep(entries: &Entries, ttl: Duration) -> usize {
    let before = entries.len();
    entries.retain(|_, shot| shot.age() < ttl);
    before.saturating_sub(entries.len())
}

fn spawn_sweeper(entries: Weak<Entries>, ttl: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(Duration::from_millis(1)));
        loop {
            interval.tick().await;
            let Some(entries) = entries.upgrade() else {
                break;
            };
            let evicted = sweep(&entries, ttl);
            if evicted > 0 {
                log::debug!("Evicted {evicted} expired screenshots");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);
    const SWEEP: Duration = Duration::from_secs(30);

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entry_survives_until_ttl_then_swept() {
        let store = ScreenshotStore::new(TTL, SWEEP);
        let id = store.insert("https://a.test/", vec![1, 2, 3]);

        tokio::time::advance(TTL - Duration::from_millis(10)).await;
        settle().await;
        assert!(store.get(&id).is_some());
        assert_eq!(store.len(), 1);

        tokio::time::advance(SWEEP).await;
        settle().await;
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_and_clear_are_immediate() {
        let store = ScreenshotStore::new(TTL, SWEEP);
        let a = store.insert("https://a.test/", vec![0; 10]);
        let b = store.insert("https://b.test/", vec![0; 20]);
        assert_eq!(store.get(&b).map(|s| s.size), Some(20));

        assert!(store.delete(&a));
        assert!(!store.delete(&a));
        assert!(store.get(&a).is_none());

        store.clear();
        assert!(store.get(&b).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_sweeping() {
        let store = ScreenshotStore::new(TTL, SWEEP);
        store.shutdown();
        let id = store.insert("https://a.test/", vec![9]);
        tokio::time::advance(TTL * 2).await;
        settle().await;
        assert_eq!(store.ids(), vec![id.clone()]);
        assert!(store.get(&id).is_none());
        assert_eq!(store.sweep_expired(), 1);
    }
}
