//! In-memory browser, classifier and persistence doubles for pipeline tests

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use intelscrape::config::CrawlConfigBuilder;
use intelscrape::{
    ClassificationError, ClassifierGateway, CrawlConfig, CrawlHandle, CrawlOrchestrator,
    CrawlUpdate, DatabaseSaveResult, DriverFactory, ExtractionRules, FilteredContentItem,
    PageDriver, PersistenceError, PersistenceGateway, ProcessedArticle,
};

/// A fake web: URL -> HTML, with optional injected failures and latency
#[derive(Default)]
pub struct MockSite {
    pages: HashMap<String, String>,
    /// Remaining navigation failures per URL, with the driver error to report
    failures: Mutex<HashMap<String, (usize, String)>>,
    nav_delay: Duration,
    fail_open: bool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    shutdowns: AtomicUsize,
    screenshots: AtomicUsize,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Fail the next `times` navigations to `url`
    pub fn flaky(self, url: &str, times: usize) -> Self {
        self.flaky_with(url, times, "net::ERR_CONNECTION_RESET")
    }

    /// Fail the next `times` navigations to `url` with a specific driver error
    pub fn flaky_with(self, url: &str, times: usize, error: &str) -> Self {
        self.failures
            .lock()
            .insert(url.to_string(), (times, error.to_string()));
        self
    }

    pub fn nav_delay(mut self, delay: Duration) -> Self {
        self.nav_delay = delay;
        self
    }

    /// Every `open_page` call fails
    pub fn unreachable_browser(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn screenshots(&self) -> usize {
        self.screenshots.load(Ordering::SeqCst)
    }
}

pub struct MockFactory {
    site: Arc<MockSite>,
}

pub fn factory(site: &Arc<MockSite>) -> Arc<dyn DriverFactory> {
    Arc::new(MockFactory {
        site: Arc::clone(site),
    })
}

#[async_trait]
impl DriverFactory for MockFactory {
    async fn open_page(&self) -> Result<Box<dyn PageDriver>> {
        if self.site.fail_open {
            return Err(anyhow!("Failed to launch browser: no executable"));
        }
        let now = self.site.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.site.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            site: Arc::clone(&self.site),
            current: Mutex::new(None),
        }))
    }

    async fn shutdown(&self) {
        self.site.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockPage {
    site: Arc<MockSite>,
    current: Mutex<Option<String>>,
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.site.navigations.lock().push(url.to_string());
        if !self.site.nav_delay.is_zero() {
            tokio::time::sleep(self.site.nav_delay).await;
        }
        {
            let mut failures = self.site.failures.lock();
            if let Some((remaining, error)) = failures.get_mut(url)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(anyhow!("{error}"));
            }
        }
        if !self.site.pages.contains_key(url) {
            return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}"));
        }
        *self.current.lock() = Some(url.to_string());
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        let current = self.current.lock().clone();
        current
            .and_then(|url| self.site.pages.get(&url).cloned())
            .ok_or_else(|| anyhow!("no document loaded"))
    }

    async fn scroll_height(&self) -> Result<u64> {
        Ok(2000)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn simulate_human(&self) -> Result<()> {
        Ok(())
    }

    async fn screenshot(&self, _quality: u8) -> Result<Vec<u8>> {
        self.site.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    async fn close(&self) -> Result<()> {
        self.site.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// HTML listing with `n` articles and an optional `rel=next` link
pub fn listing(prefix: &str, n: usize, next: Option<&str>) -> String {
    let articles: String = (0..n)
        .map(|i| {
            format!(
                r#"<article><h2><a href="https://news.test/news/{prefix}-{i}">Ransomware crew hits {prefix} target number {i}</a></h2>
                   <p>Attackers encrypted systems at victim {i} of the {prefix} campaign.</p></article>"#
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a rel="next" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!("<html><body>{articles}{next}</body></html>")
}

/// Quiet, fast configuration: no stealth, no screenshots, no AI, no delays
pub fn test_config() -> CrawlConfigBuilder {
    CrawlConfig::builder()
        .stealth(false)
        .enable_screenshots(false)
        .enable_ai_processing(false)
        .scroll_wait_ms(0)
        .retry_base_delay_ms(0)
        .max_request_retries(0)
        .max_scroll_attempts(1)
        .extraction_rules(ExtractionRules {
            article: vec!["article".into()],
            headline: vec![],
            link: vec![],
            clickable: vec![],
        })
}

pub fn orchestrator(site: &Arc<MockSite>) -> CrawlOrchestrator {
    let site = Arc::clone(site);
    CrawlOrchestrator::new(Arc::new(move |_config: &CrawlConfig| factory(&site)))
}

/// Every update of a session up to and including the terminal one
pub async fn collect(handle: &CrawlHandle) -> Vec<CrawlUpdate> {
    let mut rx = handle.subscribe();
    let mut updates = Vec::new();
    let deadline = Duration::from_secs(30);
    loop {
        match tokio::time::timeout(deadline, rx.recv()).await {
            Ok(Ok(update)) => {
                let terminal = update.is_terminal();
                updates.push(update);
                if terminal {
                    break;
                }
            }
            Ok(Err(e)) => panic!("update stream broke: {e}"),
            Err(_) => panic!("no terminal update within {deadline:?}"),
        }
    }
    handle.wait().await;
    updates
}

pub fn analysis_response(batch: &[FilteredContentItem]) -> String {
    let records: Vec<String> = (0..batch.len())
        .map(|i| {
            format!(
                r#"{{"index":{i},"riskScore":8,"eventType":"MALWARE_CAMPAIGN","attacker":"LockBit","victim":"Victim {i}","vulnerabilities":["CVE-2024-1234"],"keywords":["ransomware"],"confidenceScore":0.9,"relevanceScore":0.8,"summary":"Ransomware incident"}}"#
            )
        })
        .collect();
    format!(r#"{{"articles":[{}]}}"#, records.join(","))
}

/// Replies per call: valid JSON unless the call number is scripted otherwise
#[derive(Default)]
pub struct ScriptedClassifier {
    calls: AtomicUsize,
    scripted: Mutex<HashMap<usize, Result<String, ClassificationError>>>,
    delay: Duration,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, call: usize, response: Result<String, ClassificationError>) -> Self {
        self.scripted.lock().insert(call, response);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassifierGateway for ScriptedClassifier {
    async fn classify(&self, batch: &[FilteredContentItem]) -> Result<String, ClassificationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.scripted.lock().remove(&call) {
            Some(response) => response,
            None => Ok(analysis_response(batch)),
        }
    }
}

/// Records what it was asked to save
#[derive(Default)]
pub struct RecordingPersistence {
    pub saved: Mutex<VecDeque<Vec<ProcessedArticle>>>,
}

#[async_trait]
impl PersistenceGateway for RecordingPersistence {
    async fn save(
        &self,
        articles: &[ProcessedArticle],
    ) -> Result<DatabaseSaveResult, PersistenceError> {
        self.saved.lock().push_back(articles.to_vec());
        Ok(DatabaseSaveResult {
            articles_saved: articles.len(),
            analyses_saved: articles.len(),
            errors: Vec::new(),
        })
    }
}

pub struct FailingPersistence;

#[async_trait]
impl PersistenceGateway for FailingPersistence {
    async fn save(
        &self,
        _articles: &[ProcessedArticle],
    ) -> Result<DatabaseSaveResult, PersistenceError> {
        Err(PersistenceError::Connection("database is locked".into()))
    }
}
