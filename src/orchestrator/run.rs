//! The pipeline a session runs: crawl, filter, classify, save

use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::session::CrawlSession;
use crate::classifier::{BatchClassifier, ClassifierGateway};
use crate::crawl_events::{CompletePayload, CrawlEvent, ErrorPayload, LogLevel};
use crate::errors::FatalSessionError;
use crate::extractor::ContentExtractor;
use crate::fetcher::{DriverFactory, PageFetcher, UrlOutcome};
use crate::filter::QualityFilter;
use crate::model::{CrawlPhase, DatabaseSaveResult, RawContentItem};
use crate::persistence::PersistenceGateway;
use crate::utils::CANCELLED_MESSAGE;

enum Outcome {
    Completed(DatabaseSaveResult),
    Cancelled,
    Failed(FatalSessionError),
}

pub(super) struct SessionRun {
    pub(super) session: Arc<CrawlSession>,
    pub(super) drivers: Arc<dyn DriverFactory>,
    pub(super) classifier: Option<Arc<dyn ClassifierGateway>>,
    pub(super) persistence: Arc<dyn PersistenceGateway>,
}

impl SessionRun {
    /// Drive the session to exactly one terminal event
    pub(super) async fn run(self) {
        let outcome = AssertUnwindSafe(self.execute())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Outcome::Failed(FatalSessionError::Internal("crawl task panicked".to_string()))
            });
        self.drivers.shutdown().await;
        self.finish(outcome);
    }

    fn cancelled(&self) -> bool {
        self.session.cancel_flag().is_cancelled()
    }

    fn enter(&self, phase: CrawlPhase, message: impl Into<String>) {
        if self.session.set_phase(phase) {
            self.session.reporter().progress(phase, message);
        }
    }

    async fn execute(&self) -> Outcome {
        let session = &self.session;
        let reporter = session.reporter();
        let config = session.config();

        if self.cancelled() {
            return Outcome::Cancelled;
        }
        self.enter(
            CrawlPhase::Crawling,
            format!("Crawling {} URLs", session.urls().len()),
        );

        let raw = match self.crawl().await {
            Ok(raw) => raw,
            Err(e) => return Outcome::Failed(e),
        };
        if self.cancelled() {
            return Outcome::Cancelled;
        }
        if session.stats().successful_pages() == 0 {
            return Outcome::Failed(FatalSessionError::NoPagesSucceeded {
                failed: session.stats().snapshot().failed_pages,
            });
        }

        let filtered = QualityFilter::new(config.min_content_length()).apply(&raw);
        session.stats().set_filtered_items(filtered.len());
        reporter.info(format!(
            "Kept {} of {} extracted items after filtering",
            filtered.len(),
            raw.len()
        ));
        reporter.emit_stats();
        session.set_raw_items(raw);
        session.set_filtered_items(filtered.clone());

        match (&self.classifier, config.enable_ai_processing()) {
            (Some(gateway), true) => {
                self.enter(
                    CrawlPhase::Processing,
                    format!("Classifying {} items", filtered.len()),
                );
                let batcher = BatchClassifier::from_config(Arc::clone(gateway), config);
                let skipped = batcher.overflow(filtered.len());
                if skipped > 0 {
                    reporter.warn(format!(
                        "AI budget covers {} items; {skipped} items left unclassified",
                        config.ai_item_cap()
                    ));
                }
                for (index, chunk) in batcher.chunks(&filtered).enumerate() {
                    if self.cancelled() {
                        return Outcome::Cancelled;
                    }
                    let result = batcher.classify_chunk(index, chunk).await;
                    if let Some(e) = &result.error {
                        reporter.warn(format!(
                            "Batch {} used fallback classification: {e}",
                            index + 1
                        ));
                    }
                    session
                        .stats()
                        .add_cybersecurity_articles(result.ai_classified());
                    for article in &result.articles {
                        session
                            .events()
                            .emit(CrawlEvent::Data(Box::new(article.clone())));
                    }
                    session.push_processed(result.articles);
                    reporter.emit_stats();
                }
            }
            (None, true) => {
                reporter.warn("AI processing enabled but no classifier is configured; skipping");
            }
            (_, false) => reporter.info("AI processing disabled; skipping classification"),
        }

        if self.cancelled() {
            return Outcome::Cancelled;
        }

        let processed = session.processed_items();
        self.enter(
            CrawlPhase::Saving,
            format!("Saving {} articles", processed.len()),
        );
        let result = match self.persistence.save(&processed).await {
            Ok(result) => result,
            Err(e) => DatabaseSaveResult::failed(e.to_string()),
        };
        if result.has_errors() {
            reporter.warn(format!(
                "Database save reported {} errors",
                result.errors.len()
            ));
        } else {
            reporter.info(format!(
                "Saved {} articles and {} analyses",
                result.articles_saved, result.analyses_saved
            ));
        }
        session
            .events()
            .emit(CrawlEvent::DatabaseSave(result.clone()));

        Outcome::Completed(result)
    }

    /// Fetch every URL with at most `maxConcurrency` fetches in flight
    async fn crawl(&self) -> Result<Vec<RawContentItem>, FatalSessionError> {
        let session = &self.session;
        let config = session.config();
        let extractor = ContentExtractor::from_config(config)
            .map_err(|e| FatalSessionError::Internal(e.to_string()))?;
        let fetcher = PageFetcher::new(
            Arc::clone(config),
            Arc::new(extractor),
            Arc::clone(session.reporter()),
            Arc::clone(session.screenshots()),
            session.cancel_flag().clone(),
        );
        let limiter = Semaphore::new(config.max_concurrency());
        let total = session.urls().len();

        let mut tasks: FuturesUnordered<_> = session
            .urls()
            .iter()
            .enumerate()
            .map(|(index, url)| {
                let fetcher = &fetcher;
                let limiter = &limiter;
                async move {
                    let outcome = self.fetch_one(fetcher, limiter, url, index + 1, total).await;
                    (index, outcome)
                }
            })
            .collect();

        let mut outcomes = Vec::with_capacity(total);
        while let Some(done) = tasks.next().await {
            outcomes.push(done);
        }
        drop(tasks);
        // first-wins dedup must not depend on completion order
        outcomes.sort_by_key(|(index, _)| *index);
        Ok(outcomes
            .into_iter()
            .flat_map(|(_, outcome)| outcome.items)
            .collect())
    }

    async fn fetch_one(
        &self,
        fetcher: &PageFetcher,
        limiter: &Semaphore,
        url: &str,
        position: usize,
        total: usize,
    ) -> UrlOutcome {
        let Ok(_permit) = limiter.acquire().await else {
            return UrlOutcome::default();
        };
        if self.cancelled() {
            return UrlOutcome::default();
        }

        let reporter = self.session.reporter();
        let driver = match self.drivers.open_page().await {
            Ok(driver) => driver,
            Err(e) => {
                let stats = self.session.stats();
                stats.page_attempted();
                stats.page_failed();
                reporter.warn(format!("Could not open a browser page for {url}: {e:#}"));
                reporter.emit_stats();
                return UrlOutcome {
                    pages_failed: 1,
                    ..UrlOutcome::default()
                };
            }
        };

        let outcome = fetcher.fetch_url(url, driver.as_ref(), position, total).await;
        if let Err(e) = driver.close().await {
            log::debug!("Failed to close page for {url}: {e}");
        }
        outcome
    }

    /// Publish the single terminal event
    fn finish(&self, outcome: Outcome) {
        let session = &self.session;
        let reporter = session.reporter();
        let stats = Arc::clone(session.stats());

        let published = match outcome {
            Outcome::Completed(result) => {
                reporter.info("Crawl completed");
                session.set_phase(CrawlPhase::Completed);
                session.events().publish_with(move || {
                    CrawlEvent::Complete(CompletePayload {
                        success: true,
                        database_save_result: Some(result),
                        error: None,
                        stats: stats.snapshot(),
                    })
                })
            }
            Outcome::Cancelled => {
                reporter.warn(CANCELLED_MESSAGE);
                session.set_phase(CrawlPhase::Cancelled);
                session.events().publish_with(move || {
                    CrawlEvent::Complete(CompletePayload {
                        success: false,
                        database_save_result: None,
                        error: Some(CANCELLED_MESSAGE.to_string()),
                        stats: stats.snapshot(),
                    })
                })
            }
            Outcome::Failed(e) => {
                reporter.log(LogLevel::Error, format!("Crawl failed: {e}"));
                session.set_phase(CrawlPhase::Error);
                session.events().publish_with(move || {
                    CrawlEvent::Error(ErrorPayload {
                        error: e.to_string(),
                        stats: stats.snapshot(),
                    })
                })
            }
        };

        if let Err(e) = published {
            log::error!("Session {}: terminal event not published: {e}", session.id());
        }
    }
}
