//! Error taxonomy for the crawl pipeline
//!
//! Only [`InvalidInputError`] and [`FatalSessionError`] ever reach a caller as
//! a terminal outcome. Navigation, extraction, classification and persistence
//! errors are absorbed where they happen and surface as log events.

use std::time::Duration;

/// Rejected before a session is created
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInputError {
    #[error("at least one URL is required to start a crawl")]
    NoUrls,

    #[error("invalid URL '{0}': only absolute http(s) URLs can be crawled")]
    InvalidUrl(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Per-page navigation failure; retried up to the configured budget
#[derive(Debug, Clone, thiserror::Error)]
pub enum NavigationError {
    #[error("navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("navigation to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("giving up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

impl NavigationError {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Transport { url, .. }
            | Self::RetriesExhausted { url, .. } => url,
        }
    }
}

/// A selector matched something that could not become a content item
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("fragment {index} of '{selector}' has no usable text")]
    EmptyFragment { selector: String, index: usize },

    #[error("fragment {index} of '{selector}' has no resolvable URL")]
    MissingUrl { selector: String, index: usize },
}

/// Chunk-local classification failure; always resolved by the fallback heuristic
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassificationError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("classifier returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("classifier response could not be used: {reason}")]
    Malformed { reason: String, raw: String },
}

/// Failure reported by the persistence gateway
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistenceError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("database query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::Connection(err.to_string())
            }
            other => Self::Query(other.to_string()),
        }
    }
}

/// Ends a session in the `error` phase
#[derive(Debug, Clone, thiserror::Error)]
pub enum FatalSessionError {
    #[error("no pages could be fetched successfully ({failed} failed)")]
    NoPagesSucceeded { failed: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Umbrella error for orchestrator entry points
#[derive(Debug, Clone, thiserror::Error)]
pub enum CrawlError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Fatal(#[from] FatalSessionError),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("crawl was cancelled")]
    Cancelled,
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::Browser(format!("{err:#}"))
    }
}

pub type CrawlResult<T> = Result<T, CrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umbrella_is_transparent() {
        let err: CrawlError = InvalidInputError::NoUrls.into();
        assert_eq!(
            err.to_string(),
            "at least one URL is required to start a crawl"
        );
    }

    #[test]
    fn anyhow_context_is_preserved() {
        let err: CrawlError = anyhow::anyhow!("socket closed")
            .context("launching chromium")
            .into();
        assert_eq!(
            err.to_string(),
            "browser error: launching chromium: socket closed"
        );
    }

    #[test]
    fn navigation_error_exposes_url() {
        let err = NavigationError::Timeout {
            url: "https://a.test/".into(),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.url(), "https://a.test/");
    }
}
