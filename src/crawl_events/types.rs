//! Event type definitions for the crawl progress stream
//!
//! A [`CrawlUpdate`] is the transport unit between a session and its
//! observers. On the wire it is a flat JSON object tagged by `type`:
//!
//! ```json
//! {"sessionId":"…","sequence":4,"timestamp":"…","type":"stats","payload":{…}}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{CrawlPhase, CrawlStats, DatabaseSaveResult, ProcessedArticle};

/// Severity of a session log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One line of the session's ordered log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub phase: CrawlPhase,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

/// Screenshot announcement; `data` is the base64 encoded JPEG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotPayload {
    pub id: String,
    pub url: String,
    pub size: usize,
    pub data: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_save_result: Option<DatabaseSaveResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub stats: CrawlStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error: String,
    pub stats: CrawlStats,
}

/// Event kinds emitted during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum CrawlEvent {
    Log(LogEntry),
    Stats(CrawlStats),
    Progress(ProgressPayload),
    Screenshot(ScreenshotPayload),
    Data(Box<ProcessedArticle>),
    DatabaseSave(DatabaseSaveResult),
    /// Terminal: the session finished, successfully or by cancellation
    Complete(CompletePayload),
    /// Terminal: the session failed fatally
    Error(ErrorPayload),
}

impl CrawlEvent {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log(LogEntry::new(level, message))
    }

    pub fn progress(phase: CrawlPhase, message: impl Into<String>) -> Self {
        Self::Progress(ProgressPayload {
            phase,
            message: message.into(),
            current_url: None,
            completed: None,
            total: None,
        })
    }

    /// Whether this event ends a session's stream
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }

    /// Wire name of the event kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Log(_) => "log",
            Self::Stats(_) => "stats",
            Self::Progress(_) => "progress",
            Self::Screenshot(_) => "screenshot",
            Self::Data(_) => "data",
            Self::DatabaseSave(_) => "database-save",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }
}

/// Envelope delivered to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlUpdate {
    pub session_id: Uuid,
    /// Per-session publish order, starting at 0
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: CrawlEvent,
}

impl CrawlUpdate {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.event.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_flat_and_type_tagged() {
        let update = CrawlUpdate {
            session_id: Uuid::nil(),
            sequence: 3,
            timestamp: Utc::now(),
            event: CrawlEvent::DatabaseSave(DatabaseSaveResult {
                articles_saved: 4,
                analyses_saved: 4,
                errors: vec![],
            }),
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "database-save");
        assert_eq!(value["payload"]["articlesSaved"], 4);
        assert_eq!(value["sequence"], 3);

        let back: CrawlUpdate = serde_json::from_value(value).unwrap();
        assert_eq!(back, update);
    }

    #[test]
    fn progress_omits_unset_fields() {
        let value =
            serde_json::to_value(CrawlEvent::progress(CrawlPhase::Initializing, "starting"))
                .unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["payload"]["phase"], "initializing");
        assert!(value["payload"].get("currentUrl").is_none());
    }

    #[test]
    fn only_complete_and_error_are_terminal() {
        assert!(!CrawlEvent::log(LogLevel::Info, "x").is_terminal());
        assert!(
            CrawlEvent::Error(ErrorPayload {
                error: "boom".into(),
                stats: CrawlStats::default(),
            })
            .is_terminal()
        );
        assert!(
            CrawlEvent::Complete(CompletePayload {
                success: true,
                database_save_result: None,
                error: None,
                stats: CrawlStats::default(),
            })
            .is_terminal()
        );
    }
}
