//! Client id -> session map for an embedding control plane
//!
//! One active session per client: starting a crawl for a client that already
//! has one aborts the old session first. Terminal sessions stay queryable for
//! a retention period, then a background task drops them.

use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use super::{CrawlHandle, CrawlOrchestrator, SessionSnapshot};
use crate::config::CrawlConfig;
use crate::crawl_events::CrawlUpdate;
use crate::errors::InvalidInputError;
use crate::utils::{SESSION_CLEANUP_INTERVAL_SECS, SESSION_RETENTION_SECS};

/// Initial capacity for the session map
const SESSION_MAP_INITIAL_CAPACITY: usize = 16;

type Sessions = Mutex<HashMap<String, Arc<CrawlHandle>>>;

pub struct SessionRegistry {
    orchestrator: CrawlOrchestrator,
    sessions: Arc<Sessions>,
    retention: Duration,
    cleanup: SyncMutex<Option<JoinHandle<()>>>,
}

impl SessionRegistry {
    /// Registry with the default retention and cleanup interval
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(orchestrator: CrawlOrchestrator) -> Self {
        Self::with_retention(
            orchestrator,
            Duration::from_secs(SESSION_RETENTION_SECS),
            Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS),
        )
    }

    #[must_use]
    pub fn with_retention(
        orchestrator: CrawlOrchestrator,
        retention: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        let sessions = Arc::new(Mutex::new(HashMap::with_capacity(
            SESSION_MAP_INITIAL_CAPACITY,
        )));
        let cleanup = spawn_cleanup(Arc::downgrade(&sessions), retention, cleanup_interval);
        Self {
            orchestrator,
            sessions,
            retention,
            cleanup: SyncMutex::new(Some(cleanup)),
        }
    }

    /// Start a crawl for `client_id`, aborting its current session if any
    ///
    /// Invalid input leaves an existing session untouched.
    pub async fn start(
        &self,
        client_id: &str,
        urls: Vec<String>,
        config: CrawlConfig,
    ) -> Result<Arc<CrawlHandle>, InvalidInputError> {
        let mut sessions = self.sessions.lock().await;
        let handle = Arc::new(self.orchestrator.start(urls, config)?);
        if let Some(previous) = sessions.insert(client_id.to_string(), Arc::clone(&handle))
            && previous.abort()
        {
            log::info!(
                "Client {client_id}: aborted session {} in favour of {}",
                previous.id(),
                handle.id()
            );
        }
        Ok(handle)
    }

    pub async fn get(&self, client_id: &str) -> Option<Arc<CrawlHandle>> {
        self.sessions.lock().await.get(client_id).cloned()
    }

    /// Abort the client's session; `false` when there is nothing to cancel
    pub async fn cancel(&self, client_id: &str) -> bool {
        self.get(client_id)
            .await
            .is_some_and(|handle| handle.abort())
    }

    /// Clear the client's screenshots; `false` when it has no session
    pub async fn clear_screenshots(&self, client_id: &str) -> bool {
        match self.get(client_id).await {
            Some(handle) => {
                handle.clear_screenshots();
                true
            }
            None => false,
        }
    }

    /// The client went away: abort and forget its session
    pub async fn disconnect(&self, client_id: &str) -> Option<Arc<CrawlHandle>> {
        let removed = self.sessions.lock().await.remove(client_id);
        if let Some(handle) = &removed {
            handle.abort();
            log::debug!("Client {client_id} disconnected from session {}", handle.id());
        }
        removed
    }

    pub async fn subscribe(&self, client_id: &str) -> Option<broadcast::Receiver<CrawlUpdate>> {
        self.get(client_id).await.map(|handle| handle.subscribe())
    }

    pub async fn snapshot(&self, client_id: &str) -> Option<SessionSnapshot> {
        self.get(client_id).await.map(|handle| handle.snapshot())
    }

    /// Clients whose session has not reached a terminal phase
    pub async fn list_active(&self) -> Vec<String> {
        let sessions = self.sessions.lock().await;
        let mut active: Vec<String> = sessions
            .iter()
            .filter(|(_, handle)| !handle.is_terminal())
            .map(|(client_id, _)| client_id.clone())
            .collect();
        active.sort();
        active
    }

    /// Drop terminal sessions older than the retention period
    pub async fn cleanup_expired(&self) -> usize {
        cleanup_sessions(&self.sessions, self.retention).await
    }

    /// Stop the cleanup task and abort every session
    pub async fn shutdown(&self) {
        if let Some(task) = self.cleanup.lock().take() {
            task.abort();
        }
        let drained: Vec<_> = self.sessions.lock().await.drain().collect();
        for (_, handle) in drained {
            handle.abort();
            handle.wait().await;
        }
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        if let Some(task) = self.cleanup.lock().take() {
            task.abort();
        }
    }
}

async fn cleanup_sessions(sessions: &Sessions, retention: Duration) -> usize {
    let mut sessions = sessions.lock().await;
    let before = sessions.len();
    sessions.retain(|client_id, handle| {
        let expired = handle
            .session()
            .finished_at()
            .is_some_and(|finished| finished.elapsed() >= retention);
        if expired {
            log::debug!("Removing finished session {} of client {client_id}", handle.id());
        }
        !expired
    });
    let removed = before - sessions.len();
    if removed > 0 {
        log::debug!("Cleaned up {removed} crawl sessions");
    }
    removed
}

fn spawn_cleanup(sessions: Weak<Sessions>, retention: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(sessions) = sessions.upgrade() else {
                break;
            };
            cleanup_sessions(&sessions, retention).await;
        }
    })
}
