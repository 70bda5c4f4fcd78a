//! Progress event stream for crawl sessions
//!
//! Each session owns one [`ProgressBroadcaster`]; any number of observers
//! subscribe to it independently. Observers attaching late only see updates
//! published after they subscribed.

pub mod bus;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod reporter;
pub mod streaming;
pub mod types;

pub use bus::ProgressBroadcaster;
pub use config::EventBusConfig;
pub use errors::EventBusError;
pub use metrics::{EventBusMetrics, MetricsSnapshot};
pub use reporter::SessionReporter;
pub use streaming::{FilteredReceiver, update_stream};
pub use types::{
    CompletePayload, CrawlEvent, CrawlUpdate, ErrorPayload, LogEntry, LogLevel, ProgressPayload,
    ScreenshotPayload,
};
