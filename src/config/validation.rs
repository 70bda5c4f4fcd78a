//! Validation and loading for `CrawlConfig`

use std::path::Path;

use scraper::Selector;

use crate::errors::InvalidInputError;

use super::types::CrawlConfig;

fn invalid(message: impl Into<String>) -> InvalidInputError {
    InvalidInputError::Config(message.into())
}

impl CrawlConfig {
    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.max_concurrency == 0 {
            return Err(invalid("maxConcurrency must be at least 1"));
        }
        if self.max_sessions_per_crawler == 0 {
            return Err(invalid("maxSessionsPerCrawler must be at least 1"));
        }
        if self.max_requests_per_crawl == 0 {
            return Err(invalid("maxRequestsPerCrawl must be at least 1"));
        }
        if self.request_handler_timeout_secs == 0 {
            return Err(invalid("requestHandlerTimeoutSecs must be at least 1"));
        }
        if self.max_pagination_pages == 0 || self.max_crawling_depth == 0 {
            return Err(invalid(
                "maxPaginationPages and maxCrawlingDepth must be at least 1",
            ));
        }
        if self.screenshot_quality > 100 {
            return Err(invalid(format!(
                "screenshotQuality must be 0-100, got {}",
                self.screenshot_quality
            )));
        }
        if self.screenshot_ttl_secs == 0 || self.screenshot_sweep_interval_secs == 0 {
            return Err(invalid(
                "screenshotTtlSecs and screenshotSweepIntervalSecs must be at least 1",
            ));
        }
        if self.enable_ai_processing && (self.ai_batch_size == 0 || self.max_ai_batches == 0) {
            return Err(invalid(
                "aiBatchSize and maxAiBatches must be at least 1 when AI processing is enabled",
            ));
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(invalid(format!(
                "minDelayMs ({}) exceeds maxDelayMs ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }

        let rules = &self.extraction_rules;
        for selector in rules
            .article
            .iter()
            .chain(&rules.headline)
            .chain(&rules.link)
            .chain(&rules.clickable)
            .chain(&self.next_page_selectors)
        {
            Selector::parse(selector)
                .map_err(|e| invalid(format!("invalid selector '{selector}': {e}")))?;
        }
        Ok(())
    }

    /// Parse and validate a camelCase JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, InvalidInputError> {
        let config: Self = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InvalidInputError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| invalid(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CrawlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrency(), 3);
        assert_eq!(config.effective_page_limit(), 3);
        assert_eq!(config.ai_item_cap(), 50);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CrawlConfig::from_json_str(
            r#"{"maxPaginationPages": 2, "enableAIProcessing": false, "aiBatchSize": 0}"#,
        )
        .unwrap();
        assert_eq!(config.effective_page_limit(), 2);
        assert!(!config.enable_ai_processing());
        assert_eq!(config.max_request_retries(), 2);
    }

    #[test]
    fn rejects_inverted_delay_range() {
        let err = CrawlConfig::builder()
            .min_delay_ms(5000)
            .max_delay_ms(100)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("minDelayMs"));
    }

    #[test]
    fn rejects_zero_concurrency_and_bad_selectors() {
        assert!(CrawlConfig::builder().max_concurrency(0).build().is_err());
        assert!(
            CrawlConfig::builder()
                .next_page_selectors(["a[rel="])
                .build()
                .is_err()
        );
        assert!(CrawlConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn pool_size_is_bounded_by_concurrency() {
        let config = CrawlConfig::builder()
            .max_concurrency(2)
            .max_sessions_per_crawler(5)
            .build()
            .unwrap();
        assert_eq!(config.effective_pool_size(), 2);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.json");
        std::fs::write(&path, r#"{"maxConcurrency": 5, "headless": false}"#).unwrap();
        let config = CrawlConfig::from_json_file(&path).unwrap();
        assert_eq!(config.max_concurrency(), 5);
        assert!(!config.headless());
    }
}
