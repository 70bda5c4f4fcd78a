//! SQLite persistence gateway
//!
//! Two tables: `articles` keyed by URL (upserted, so re-crawls refresh rather
//! than duplicate) and `analyses`, one row per classification run.

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::errors::PersistenceError;
use crate::model::{DatabaseSaveResult, ProcessedArticle};

use super::PersistenceGateway;

pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    /// Connect (creating the file if needed) and ensure the schema exists
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - in-memory database
    /// - `sqlite://./intel.db` - file-based database
    pub async fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| PersistenceError::Connection(e.to_string()))?
            .create_if_missing(true);

        // Every in-memory connection would get its own empty database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| PersistenceError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self, PersistenceError> {
        Self::connect("sqlite::memory:").await
    }

    async fn run_migrations(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                kind TEXT NOT NULL,
                source_url TEXT NOT NULL,
                source_page TEXT NOT NULL,
                page_number INTEGER NOT NULL,
                signature TEXT NOT NULL,
                crawled_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
                risk_score INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                attacker TEXT NOT NULL,
                victim TEXT NOT NULL,
                vulnerabilities TEXT NOT NULL,
                keywords TEXT NOT NULL,
                confidence_score REAL NOT NULL,
                relevance_score REAL NOT NULL,
                summary TEXT NOT NULL,
                classification_source TEXT NOT NULL,
                analysed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_analyses_article ON analyses(article_id);
            CREATE INDEX IF NOT EXISTS idx_analyses_event_type ON analyses(event_type);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn upsert_article(&self, article: &ProcessedArticle) -> Result<i64, PersistenceError> {
        let item = &article.item.item;
        let row = sqlx::query(
            r#"
            INSERT INTO articles
                (url, title, content, kind, source_url, source_page, page_number, signature, crawled_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                signature = excluded.signature,
                crawled_at = excluded.crawled_at
            RETURNING id
            "#,
        )
        .bind(&item.url)
        .bind(&item.title)
        .bind(&item.content)
        .bind(item.kind.as_str())
        .bind(&item.source_url)
        .bind(&item.source_page)
        .bind(item.page_number as i64)
        .bind(&article.item.signature)
        .bind(item.crawled_date.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn insert_analysis(
        &self,
        article_id: i64,
        article: &ProcessedArticle,
    ) -> Result<(), PersistenceError> {
        let vulnerabilities = serde_json::to_string(&article.vulnerabilities)
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        let keywords = serde_json::to_string(&article.keywords)
            .map_err(|e| PersistenceError::Query(e.to_string()))?;
        let source = if article.is_fallback() { "fallback" } else { "ai" };

        sqlx::query(
            r#"
            INSERT INTO analyses
                (article_id, risk_score, event_type, attacker, victim, vulnerabilities, keywords,
                 confidence_score, relevance_score, summary, classification_source, analysed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article_id)
        .bind(i64::from(article.risk_score))
        .bind(article.event_type.as_str())
        .bind(&article.attacker)
        .bind(&article.victim)
        .bind(vulnerabilities)
        .bind(keywords)
        .bind(f64::from(article.confidence_score))
        .bind(f64::from(article.relevance_score))
        .bind(&article.summary)
        .bind(source)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for SqlitePersistence {
    async fn save(
        &self,
        articles: &[ProcessedArticle],
    ) -> Result<DatabaseSaveResult, PersistenceError> {
        if self.pool.is_closed() {
            return Err(PersistenceError::Connection("pool is closed".into()));
        }

        let mut result = DatabaseSaveResult::default();
        for article in articles {
            let url = &article.item.item.url;
            let article_id = match self.upsert_article(article).await {
                Ok(id) => id,
                Err(e) => {
                    log::warn!("Failed to save article {url}: {e}");
                    result.errors.push(format!("{url}: {e}"));
                    continue;
                }
            };
            result.articles_saved += 1;

            match self.insert_analysis(article_id, article).await {
                Ok(()) => result.analyses_saved += 1,
                Err(e) => {
                    log::warn!("Failed to save analysis for {url}: {e}");
                    result.errors.push(format!("{url}: {e}"));
                }
            }
        }

        log::info!(
            "Saved {} articles and {} analyses ({} errors)",
            result.articles_saved,
            result.analyses_saved,
            result.errors.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ClassificationSource, ContentKind, EventType, FilteredContentItem, RawContentItem,
    };
    use chrono::Utc;

    fn article(url: &str, risk: u8) -> ProcessedArticle {
        ProcessedArticle {
            item: FilteredContentItem {
                item: RawContentItem {
                    kind: ContentKind::Article,
                    title: format!("Story at {url}"),
                    url: url.into(),
                    content: "body".into(),
                    index: 0,
                    source_url: "https://s.test/".into(),
                    crawled_date: Utc::now(),
                    page_number: 1,
                    content_length: 4,
                    source_page: "https://s.test/".into(),
                    selector: "article".into(),
                },
                signature: "sig".into(),
            },
            risk_score: risk,
            event_type: EventType::DataBreach,
            attacker: "Unknown".into(),
            victim: "Acme".into(),
            vulnerabilities: vec!["CVE-2024-0001".into()],
            keywords: vec!["breach".into()],
            confidence_score: 0.5,
            relevance_score: 0.5,
            summary: "summary".into(),
            classification_source: ClassificationSource::Ai,
        }
    }

    async fn count(store: &SqlitePersistence, table: &str) -> i64 {
        sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(store.pool())
            .await
            .unwrap()
            .get("n")
    }

    #[tokio::test]
    async fn upserts_articles_by_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("intel.db").display());
        let store = SqlitePersistence::connect(&url).await.unwrap();

        let first = store
            .save(&[article("https://s.test/a", 3), article("https://s.test/b", 9)])
            .await
            .unwrap();
        assert_eq!(first.articles_saved, 2);
        assert_eq!(first.analyses_saved, 2);
        assert!(first.errors.is_empty());

        store.save(&[article("https://s.test/a", 4)]).await.unwrap();
        assert_eq!(count(&store, "articles").await, 2);
        assert_eq!(count(&store, "analyses").await, 3);
    }

    #[tokio::test]
    async fn closed_pool_is_an_error() {
        let store = SqlitePersistence::in_memory().await.unwrap();
        store.close().await;
        assert!(matches!(
            store.save(&[article("https://s.test/a", 1)]).await,
            Err(PersistenceError::Connection(_))
        ));
    }
}
