//! Session lifecycle: starting crawls, observing them and cancelling them
//!
//! A [`CrawlOrchestrator`] holds the external collaborators (browser driver
//! provider, classifier, persistence) and starts sessions. Each started
//! session is represented by a [`CrawlHandle`]; the [`SessionRegistry`] maps
//! client ids to handles for an embedding control plane.

mod registry;
mod run;
mod session;

pub use registry::SessionRegistry;
pub use session::{CrawlSession, SessionSnapshot};

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::browser::ChromiumDriverFactory;
use crate::classifier::ClassifierGateway;
use crate::config::CrawlConfig;
use crate::crawl_events::{CrawlEvent, CrawlUpdate, update_stream};
use crate::errors::InvalidInputError;
use crate::fetcher::DriverFactory;
use crate::model::CrawlPhase;
use crate::persistence::{NullPersistence, PersistenceGateway};
use crate::utils::is_valid_url;

use run::SessionRun;

/// Builds the per-session browser backend; each session gets its own pool
pub type DriverProvider = Arc<dyn Fn(&CrawlConfig) -> Arc<dyn DriverFactory> + Send + Sync>;

#[derive(Clone)]
pub struct CrawlOrchestrator {
    drivers: DriverProvider,
    classifier: Option<Arc<dyn ClassifierGateway>>,
    persistence: Arc<dyn PersistenceGateway>,
}

impl CrawlOrchestrator {
    /// Orchestrator without a classifier, persisting nothing
    #[must_use]
    pub fn new(drivers: DriverProvider) -> Self {
        Self {
            drivers,
            classifier: None,
            persistence: Arc::new(NullPersistence),
        }
    }

    /// Orchestrator backed by pooled Chromium sessions
    #[must_use]
    pub fn chromium() -> Self {
        Self::new(Arc::new(|config: &CrawlConfig| {
            Arc::new(ChromiumDriverFactory::from_config(config)) as Arc<dyn DriverFactory>
        }))
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ClassifierGateway>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceGateway>) -> Self {
        self.persistence = persistence;
        self
    }

    /// Validate input and start a session in the background
    ///
    /// The session moves to `initializing` and publishes its first progress
    /// update before this returns; the handle's first subscriber receives it.
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        urls: Vec<String>,
        config: CrawlConfig,
    ) -> Result<CrawlHandle, InvalidInputError> {
        if urls.is_empty() {
            return Err(InvalidInputError::NoUrls);
        }
        if let Some(bad) = urls.iter().find(|url| !is_valid_url(url)) {
            return Err(InvalidInputError::InvalidUrl(bad.clone()));
        }
        config.validate()?;

        let drivers = (self.drivers)(&config);
        let session = Arc::new(CrawlSession::new(urls, config));
        let first_receiver = session.events().subscribe();

        session.set_phase(CrawlPhase::Initializing);
        session.events().emit(CrawlEvent::progress(
            CrawlPhase::Initializing,
            format!("Starting crawl of {} URLs", session.urls().len()),
        ));
        log::info!(
            "Session {} started for {} URLs",
            session.id(),
            session.urls().len()
        );

        let run = SessionRun {
            session: Arc::clone(&session),
            drivers,
            classifier: self.classifier.clone(),
            persistence: Arc::clone(&self.persistence),
        };
        let task = tokio::spawn(run.run());

        Ok(CrawlHandle {
            session,
            task: Mutex::new(Some(task)),
            first_receiver: Mutex::new(Some(first_receiver)),
        })
    }
}

/// A running or finished session
#[derive(Debug)]
pub struct CrawlHandle {
    session: Arc<CrawlSession>,
    task: Mutex<Option<JoinHandle<()>>>,
    first_receiver: Mutex<Option<broadcast::Receiver<CrawlUpdate>>>,
}

impl CrawlHandle {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.session.id()
    }

    #[must_use]
    pub fn session(&self) -> &Arc<CrawlSession> {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> CrawlPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.session.is_terminal()
    }

    /// Receive updates published from now on
    ///
    /// The first call also yields everything published since `start`.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlUpdate> {
        self.first_receiver
            .lock()
            .take()
            .unwrap_or_else(|| self.session.events().subscribe())
    }

    /// [`subscribe`](Self::subscribe) as a stream ending after the terminal update
    pub fn updates(&self) -> impl tokio_stream::Stream<Item = CrawlUpdate> + Send + 'static {
        update_stream(self.subscribe())
    }

    /// Request cancellation
    ///
    /// Returns `false` when the session is already terminal or was already
    /// asked to stop; calling it again is harmless.
    pub fn abort(&self) -> bool {
        if self.session.is_terminal() {
            return false;
        }
        let first = self.session.cancel_flag().cancel();
        if first {
            log::info!("Session {}: cancellation requested", self.session.id());
        }
        first
    }

    /// Remove every stored screenshot of this session
    pub fn clear_screenshots(&self) {
        self.session.screenshots().clear();
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Wait for the background task to finish
    pub async fn wait(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            log::error!("Session {} task failed: {e}", self.session.id());
        }
    }
}
