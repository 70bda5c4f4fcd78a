//! Data model shared by every stage of the pipeline
//!
//! Items flow raw -> filtered -> processed; stats and phases describe the
//! session that produced them.

pub mod items;
pub mod phase;
pub mod stats;

pub use items::{
    ClassificationSource, ContentKind, DatabaseSaveResult, EventType, FilteredContentItem,
    ProcessedArticle, RawContentItem,
};
pub use phase::CrawlPhase;
pub use stats::{CrawlStats, StatsTracker};
