pub mod browser;
pub mod cancel;
pub mod classifier;
pub mod config;
pub mod crawl_events;
pub mod errors;
pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod model;
pub mod orchestrator;
pub mod persistence;
pub mod screenshot_store;
pub mod stealth;
pub mod utils;

pub use browser::{ChromiumDriverFactory, SessionPool};
pub use cancel::CancelFlag;
pub use classifier::{BatchClassifier, ClassifierGateway, HttpClassifier};
pub use config::{CrawlConfig, CrawlConfigBuilder, ExtractionRules};
pub use crawl_events::{CrawlEvent, CrawlUpdate, LogLevel, ProgressBroadcaster};
pub use errors::{
    ClassificationError, CrawlError, CrawlResult, ExtractionError, FatalSessionError, InvalidInputError,
    NavigationError, PersistenceError,
};
pub use extractor::ContentExtractor;
pub use fetcher::{DriverFactory, PageDriver, PageFetcher};
pub use filter::QualityFilter;
pub use model::{
    CrawlPhase, CrawlStats, DatabaseSaveResult, EventType, FilteredContentItem, ProcessedArticle,
    RawContentItem,
};
pub use orchestrator::{
    CrawlHandle, CrawlOrchestrator, CrawlSession, DriverProvider, SessionRegistry,
    SessionSnapshot,
};
pub use persistence::{NullPersistence, PersistenceGateway, SqlitePersistence};
pub use screenshot_store::ScreenshotStore;
