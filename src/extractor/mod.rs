//! Turns a loaded page's HTML into candidate content fragments
//!
//! Extraction is synchronous and works only on already-fetched markup. Each
//! rule kind (article, headline, link, clickable) contributes fragments
//! stamped with the selector and match index that produced them.

mod pagination;

pub use pagination::find_next_page_url;

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::config::{CrawlConfig, ExtractionRules};
use crate::errors::ExtractionError;
use crate::model::{ContentKind, RawContentItem};
use crate::utils::{canonicalize_url, collapse_whitespace, resolve_url, safe_truncate_chars};

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, .title, .headline")
        .expect("BUG: hardcoded CSS selector for titles is invalid")
});

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

/// Longest title synthesized from body text when a fragment has no heading
const MAX_DERIVED_TITLE_CHARS: usize = 160;

/// Where a page sits in the crawl
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Seed URL the crawl started from
    pub seed_url: &'a str,
    /// URL of the page being extracted
    pub page_url: &'a str,
    /// 1-based position in the pagination chain
    pub page_number: usize,
}

#[derive(Debug)]
struct CompiledRule {
    kind: ContentKind,
    source: String,
    selector: Selector,
}

#[derive(Debug)]
pub struct ContentExtractor {
    rules: Vec<CompiledRule>,
    next_page_selectors: Vec<Selector>,
}

impl ContentExtractor {
    /// Compile the configured rules
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidSelector` for the first selector that
    /// fails to parse.
    pub fn new(
        rules: &ExtractionRules,
        next_page_selectors: &[String],
    ) -> Result<Self, ExtractionError> {
        let mut compiled = Vec::new();
        for kind in ContentKind::ALL {
            let sources = match kind {
                ContentKind::Article => &rules.article,
                ContentKind::Headline => &rules.headline,
                ContentKind::Link => &rules.link,
                ContentKind::Clickable => &rules.clickable,
            };
            for source in sources {
                compiled.push(CompiledRule {
                    kind,
                    source: source.clone(),
                    selector: parse_selector(source)?,
                });
            }
        }

        let next_page_selectors = next_page_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules: compiled,
            next_page_selectors,
        })
    }

    pub fn from_config(config: &CrawlConfig) -> Result<Self, ExtractionError> {
        Self::new(config.extraction_rules(), config.next_page_selectors())
    }

    /// Extract every usable fragment from `html`
    ///
    /// Unusable matches (no text, no resolvable URL) are dropped and logged at
    /// debug level; they never fail the page. Rules run in kind order and a
    /// fragment already claimed by an earlier match (same element, same
    /// anchor, or same URL and title) is skipped.
    #[must_use]
    pub fn extract(&self, html: &str, page: PageContext<'_>) -> Vec<RawContentItem> {
        let document = Html::parse_document(html);
        let crawled_date = Utc::now();
        let mut items = Vec::new();
        let mut claimed_nodes = HashSet::new();
        let mut claimed_targets = HashSet::new();

        for rule in &self.rules {
            for (index, element) in document.select(&rule.selector).enumerate() {
                let anchor = first_anchor(element).map(|a| a.id());
                if claimed_nodes.contains(&element.id())
                    || anchor.is_some_and(|id| claimed_nodes.contains(&id))
                {
                    continue;
                }
                match build_item(rule, element, index, page) {
                    Ok((title, url, content)) => {
                        let target = (canonicalize_url(&url), title.to_lowercase());
                        if !claimed_targets.insert(target) {
                            continue;
                        }
                        claimed_nodes.insert(element.id());
                        claimed_nodes.extend(anchor);
                        let content_length = content.chars().count();
                        items.push(RawContentItem {
                            kind: rule.kind,
                            title,
                            url,
                            content,
                            index,
                            source_url: page.seed_url.to_string(),
                            crawled_date,
                            page_number: page.page_number,
                            content_length,
                            source_page: page.page_url.to_string(),
                            selector: rule.source.clone(),
                        });
                    }
                    Err(e) => log::debug!("Dropped fragment on {}: {e}", page.page_url),
                }
            }
        }

        log::debug!(
            "Extracted {} fragments from {} (page {})",
            items.len(),
            page.page_url,
            page.page_number
        );
        items
    }

    /// Locate the next page of a paginated listing
    #[must_use]
    pub fn next_page_url(&self, html: &str, page_url: &str) -> Option<String> {
        find_next_page_url(html, page_url, &self.next_page_selectors)
    }
}

fn parse_selector(source: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(source).map_err(|e| ExtractionError::InvalidSelector {
        selector: source.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn first_anchor(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if element.value().name() == "a" && element.value().attr("href").is_some() {
        return Some(element);
    }
    element.select(&ANCHOR_SELECTOR).next()
}

fn anchor_url(element: ElementRef<'_>, page_url: &str) -> Option<String> {
    first_anchor(element)
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_url(page_url, href))
}

fn derived_title(content: &str) -> String {
    safe_truncate_chars(content, MAX_DERIVED_TITLE_CHARS).to_string()
}

/// Resolve `(title, url, content)` for one matched element
fn build_item(
    rule: &CompiledRule,
    element: ElementRef<'_>,
    index: usize,
    page: PageContext<'_>,
) -> Result<(String, String, String), ExtractionError> {
    let content = element_text(element);
    if content.is_empty() {
        return Err(ExtractionError::EmptyFragment {
            selector: rule.source.clone(),
            index,
        });
    }
    let missing_url = || ExtractionError::MissingUrl {
        selector: rule.source.clone(),
        index,
    };

    match rule.kind {
        ContentKind::Article => {
            let title = element
                .select(&TITLE_SELECTOR)
                .map(element_text)
                .find(|t| !t.is_empty())
                .or_else(|| first_anchor(element).map(element_text).filter(|t| !t.is_empty()))
                .unwrap_or_else(|| derived_title(&content));
            // Inline article bodies without a permalink belong to the page itself
            let url = anchor_url(element, page.page_url).unwrap_or_else(|| page.page_url.to_string());
            Ok((title, url, content))
        }
        ContentKind::Headline | ContentKind::Link => {
            let url = anchor_url(element, page.page_url).ok_or_else(missing_url)?;
            Ok((content.clone(), url, content))
        }
        ContentKind::Clickable => {
            let target = element
                .value()
                .attr("data-href")
                .or_else(|| element.value().attr("data-url"))
                .and_then(|href| resolve_url(page.page_url, href))
                .or_else(|| anchor_url(element, page.page_url))
                .ok_or_else(missing_url)?;
            let title = element
                .select(&TITLE_SELECTOR)
                .map(element_text)
                .find(|t| !t.is_empty())
                .unwrap_or_else(|| derived_title(&content));
            Ok((title, target, content))
        }
    }
}
