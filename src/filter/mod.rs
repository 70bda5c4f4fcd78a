//! Quality filter and deduplicator
//!
//! Drops fragments that are too short or look like navigation boilerplate,
//! then deduplicates by a normalized signature where the first occurrence
//! wins. Filtering is pure and idempotent.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use xxhash_rust::xxh3::xxh3_64;

use crate::model::{FilteredContentItem, RawContentItem};
use crate::utils::{canonicalize_url, collapse_whitespace};

/// Navigation and call-to-action text that is never threat content
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(home|menu|search|login|log in|sign in|sign up|subscribe( now)?|read more|continue reading|share|share this|next|previous|older posts|newer posts|load more|cookie settings|accept( all)? cookies|privacy policy|terms of (use|service)|contact us|about us|advertisement)$",
    )
    .expect("BUG: hardcoded boilerplate regex is invalid")
});

/// Normalized dedup signature: xxh3 of lower-cased, whitespace-collapsed
/// title plus canonical URL, hex encoded
#[must_use]
pub fn content_signature(title: &str, url: &str) -> String {
    let normalized = format!(
        "{}\n{}",
        collapse_whitespace(title).to_lowercase(),
        canonicalize_url(url)
    );
    hex::encode(xxh3_64(normalized.as_bytes()).to_be_bytes())
}

#[derive(Debug, Clone)]
pub struct QualityFilter {
    min_content_length: usize,
}

impl QualityFilter {
    #[must_use]
    pub fn new(min_content_length: usize) -> Self {
        Self { min_content_length }
    }

    /// Whether a fragment carries enough real text to be worth classifying
    #[must_use]
    pub fn is_substantive(&self, item: &RawContentItem) -> bool {
        let title = collapse_whitespace(&item.title);
        let content = collapse_whitespace(&item.content);
        let longest = title.chars().count().max(content.chars().count());
        if longest < self.min_content_length {
            return false;
        }
        !(BOILERPLATE.is_match(&title) && (content.is_empty() || BOILERPLATE.is_match(&content)))
    }

    /// Filter and deduplicate `items`, preserving input order
    #[must_use]
    pub fn apply(&self, items: &[RawContentItem]) -> Vec<FilteredContentItem> {
        let mut seen = HashSet::new();
        let mut short = 0usize;
        let mut duplicates = 0usize;

        let kept: Vec<FilteredContentItem> = items
            .iter()
            .filter(|item| {
                let keep = self.is_substantive(item);
                if !keep {
                    short += 1;
                }
                keep
            })
            .filter_map(|item| {
                let signature = content_signature(&item.title, &item.url);
                if seen.insert(signature.clone()) {
                    Some(FilteredContentItem {
                        item: item.clone(),
                        signature,
                    })
                } else {
                    duplicates += 1;
                    None
                }
            })
            .collect();

        log::debug!(
            "Quality filter kept {} of {} fragments ({short} low quality, {duplicates} duplicates)",
            kept.len(),
            items.len()
        );
        kept
    }

    /// Re-apply the filter to an already filtered set
    #[must_use]
    pub fn reapply(&self, items: &[FilteredContentItem]) -> Vec<FilteredContentItem> {
        let raw: Vec<RawContentItem> = items.iter().map(|f| f.item.clone()).collect();
        self.apply(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentKind;
    use chrono::Utc;

    fn item(title: &str, url: &str, content: &str) -> RawContentItem {
        RawContentItem {
            kind: ContentKind::Headline,
            title: title.into(),
            url: url.into(),
            content: content.into(),
            index: 0,
            source_url: "https://s.test/".into(),
            crawled_date: Utc::now(),
            page_number: 1,
            content_length: content.chars().count(),
            source_page: "https://s.test/".into(),
            selector: "h2 a".into(),
        }
    }

    #[test]
    fn first_duplicate_wins() {
        let filter = QualityFilter::new(10);
        let items = vec![
            item("Critical  Fortinet flaw exploited", "https://s.test/a?utm_source=x", "first"),
            item("critical fortinet flaw exploited", "https://www.s.test/a/", "second"),
            item("Another story about a breach", "https://s.test/b", ""),
        ];
        let out = filter.apply(&items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].item.content, "first");
        assert_eq!(out[1].item.title, "Another story about a breach");
    }

    #[test]
    fn drops_short_and_boilerplate() {
        let filter = QualityFilter::new(12);
        let items = vec![
            item("Read more", "https://s.test/x", "Read more"),
            item("Home", "https://s.test/", ""),
            item("tiny", "https://s.test/t", "tiny"),
            item("Privacy Policy", "https://s.test/privacy", "privacy policy"),
            item("Subscribe", "https://s.test/s", "Get weekly intel on the latest attacks"),
        ];
        let out = filter.apply(&items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].item.url, "https://s.test/s");
    }

    #[test]
    fn signature_ignores_case_whitespace_and_tracking() {
        assert_eq!(
            content_signature("  Zero-Day   in Chrome ", "https://x.test/p?utm_medium=a"),
            content_signature("zero-day in chrome", "https://x.test/p")
        );
        assert_ne!(
            content_signature("zero-day in chrome", "https://x.test/p"),
            content_signature("zero-day in chrome", "https://x.test/q")
        );
    }

    #[test]
    fn reapply_is_noop() {
        let filter = QualityFilter::new(5);
        let items = vec![
            item("Story one headline", "https://s.test/1", ""),
            item("Story one headline", "https://s.test/1", ""),
            item("Story two headline", "https://s.test/2", ""),
        ];
        let once = filter.apply(&items);
        assert_eq!(filter.reapply(&once), once);
    }
}
