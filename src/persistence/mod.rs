//! Persistence gateway for processed articles
//!
//! The orchestrator calls [`PersistenceGateway::save`] once per session with
//! the full processed set. A failure here is reported in the session's
//! `database-save` and `complete` events and never fails the crawl.

mod sqlite;

pub use sqlite::SqlitePersistence;

use async_trait::async_trait;

use crate::errors::PersistenceError;
use crate::model::{DatabaseSaveResult, ProcessedArticle};

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Store articles and their analyses
    ///
    /// Per-article failures belong in `DatabaseSaveResult::errors`; an `Err`
    /// means nothing could be attempted at all.
    async fn save(&self, articles: &[ProcessedArticle])
    -> Result<DatabaseSaveResult, PersistenceError>;
}

/// Gateway that stores nothing; used when no database is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPersistence;

#[async_trait]
impl PersistenceGateway for NullPersistence {
    async fn save(
        &self,
        _articles: &[ProcessedArticle],
    ) -> Result<DatabaseSaveResult, PersistenceError> {
        Ok(DatabaseSaveResult::default())
    }
}
