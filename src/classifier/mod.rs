//! Batched threat classification with per-chunk fallback
//!
//! The filtered set is split into chunks of `aiBatchSize`, capped at
//! `maxAiBatches * aiBatchSize` items overall. Every chunk is classified
//! independently: a timeout, transport error or malformed response only
//! affects that chunk, whose items then receive the fallback heuristic.

pub mod fallback;
pub mod http;
pub mod schema;

pub use fallback::fallback_article;
pub use http::HttpClassifier;
pub use schema::{ArticleAnalysis, BatchOutcome, parse_response};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CrawlConfig;
use crate::errors::ClassificationError;
use crate::model::{ClassificationSource, FilteredContentItem, ProcessedArticle};

/// External AI capability: returns the raw response text for a chunk
#[async_trait]
pub trait ClassifierGateway: Send + Sync {
    async fn classify(&self, batch: &[FilteredContentItem]) -> Result<String, ClassificationError>;
}

/// Result of classifying one chunk
#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub chunk_index: usize,
    /// One article per input item, in input order
    pub articles: Vec<ProcessedArticle>,
    /// Why the chunk fell back, if it did
    pub error: Option<ClassificationError>,
}

impl ChunkResult {
    /// Items classified by the AI capability rather than the fallback
    #[must_use]
    pub fn ai_classified(&self) -> usize {
        self.articles
            .iter()
            .filter(|a| a.classification_source == ClassificationSource::Ai)
            .count()
    }
}

pub struct BatchClassifier {
    gateway: Arc<dyn ClassifierGateway>,
    batch_size: usize,
    max_batches: usize,
    batch_timeout: Duration,
}

impl BatchClassifier {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ClassifierGateway>,
        batch_size: usize,
        max_batches: usize,
        batch_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            batch_size: batch_size.max(1),
            max_batches,
            batch_timeout,
        }
    }

    #[must_use]
    pub fn from_config(gateway: Arc<dyn ClassifierGateway>, config: &CrawlConfig) -> Self {
        Self::new(
            gateway,
            config.ai_batch_size(),
            config.max_ai_batches(),
            config.ai_batch_timeout(),
        )
    }

    /// Chunks to classify; items beyond the overall cap are left out
    pub fn chunks<'a>(
        &self,
        items: &'a [FilteredContentItem],
    ) -> std::slice::Chunks<'a, FilteredContentItem> {
        let cap = self.batch_size.saturating_mul(self.max_batches);
        items[..items.len().min(cap)].chunks(self.batch_size)
    }

    /// Number of items that [`chunks`](Self::chunks) would skip
    #[must_use]
    pub fn overflow(&self, total: usize) -> usize {
        total.saturating_sub(self.batch_size.saturating_mul(self.max_batches))
    }

    /// Classify one chunk, falling back on any failure
    pub async fn classify_chunk(
        &self,
        chunk_index: usize,
        chunk: &[FilteredContentItem],
    ) -> ChunkResult {
        let response =
            match tokio::time::timeout(self.batch_timeout, self.gateway.classify(chunk)).await {
                Ok(result) => result,
                Err(_) => Err(ClassificationError::Timeout(self.batch_timeout)),
            };

        let outcome = response.map(|raw| parse_response(&raw, chunk.len()));
        match outcome {
            Ok(BatchOutcome::Classified(analyses)) => ChunkResult {
                chunk_index,
                articles: chunk
                    .iter()
                    .zip(analyses)
                    .map(|(item, analysis)| merge(item, analysis))
                    .collect(),
                error: None,
            },
            Ok(BatchOutcome::Malformed { reason, raw }) => {
                log::warn!("Chunk {chunk_index} returned malformed output ({reason}); using fallback");
                Self::fall_back(chunk_index, chunk, ClassificationError::Malformed { reason, raw })
            }
            Err(e) => {
                log::warn!("Chunk {chunk_index} classification failed: {e}; using fallback");
                Self::fall_back(chunk_index, chunk, e)
            }
        }
    }

    fn fall_back(
        chunk_index: usize,
        chunk: &[FilteredContentItem],
        error: ClassificationError,
    ) -> ChunkResult {
        ChunkResult {
            chunk_index,
            articles: chunk.iter().map(fallback_article).collect(),
            error: Some(error),
        }
    }

    /// Classify every chunk in order
    pub async fn classify_all(&self, items: &[FilteredContentItem]) -> Vec<ChunkResult> {
        let mut results = Vec::new();
        for (i, chunk) in self.chunks(items).enumerate() {
            results.push(self.classify_chunk(i, chunk).await);
        }
        results
    }
}

fn merge(item: &FilteredContentItem, analysis: ArticleAnalysis) -> ProcessedArticle {
    ProcessedArticle {
        item: item.clone(),
        risk_score: analysis.risk_score,
        event_type: analysis.event_type,
        attacker: analysis.attacker,
        victim: analysis.victim,
        vulnerabilities: analysis.vulnerabilities,
        keywords: analysis.keywords,
        confidence_score: analysis.confidence_score,
        relevance_score: analysis.relevance_score,
        summary: analysis.summary,
        classification_source: ClassificationSource::Ai,
    }
}
