//! "Next page" discovery for paginated listings

use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::utils::{NEXT_PAGE_TEXTS, canonicalize_url, resolve_url};

use super::element_text;

static REL_NEXT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("link[rel~='next'][href], a[rel~='next'][href]")
        .expect("BUG: hardcoded CSS selector for rel=next is invalid")
});

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

/// Find the URL of the next page, or `None` when pagination ends here
///
/// Checked in order: `rel=next`, the configured selectors, then anchors whose
/// text reads like "next"/"older"/"»". Links back to the current page are
/// ignored.
#[must_use]
pub fn find_next_page_url(html: &str, page_url: &str, selectors: &[Selector]) -> Option<String> {
    let document = Html::parse_document(html);
    let current = canonicalize_url(page_url);
    let usable = |href: &str| {
        resolve_url(page_url, href).filter(|resolved| canonicalize_url(resolved) != current)
    };

    let from_rel = document
        .select(&REL_NEXT_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .find_map(usable);
    if from_rel.is_some() {
        return from_rel;
    }

    for selector in selectors {
        let found = document
            .select(selector)
            .filter_map(|el| {
                if el.value().name() == "a" {
                    el.value().attr("href")
                } else {
                    el.select(&ANCHOR_SELECTOR)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                }
            })
            .find_map(usable);
        if found.is_some() {
            return found;
        }
    }

    document
        .select(&ANCHOR_SELECTOR)
        .filter(|a| {
            let text = element_text(*a).to_lowercase();
            let text = text.trim_matches(|c: char| c.is_whitespace() || c == '→');
            NEXT_PAGE_TEXTS.contains(&text)
                || a.value().attr("aria-label").is_some_and(|l| l.eq_ignore_ascii_case("next"))
        })
        .filter_map(|a| a.value().attr("href"))
        .find_map(usable)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://sec.test/news?page=1";

    #[test]
    fn prefers_rel_next() {
        let html = r#"<head><link rel="next" href="/news?page=2"></head>
                      <body><a href="/other">Next</a></body>"#;
        assert_eq!(
            find_next_page_url(html, PAGE, &[]).as_deref(),
            Some("https://sec.test/news?page=2")
        );
    }

    #[test]
    fn uses_configured_selector_before_text() {
        let selector = Selector::parse(".pager .forward").unwrap();
        let html = r#"<div class="pager"><span class="forward"><a href="/p/2">2</a></span></div>
                      <a href="/p/9">Older</a>"#;
        assert_eq!(
            find_next_page_url(html, PAGE, &[selector]).as_deref(),
            Some("https://sec.test/p/2")
        );
    }

    #[test]
    fn falls_back_to_anchor_text() {
        let html = r#"<a href="/news?page=2">  » </a>"#;
        assert_eq!(
            find_next_page_url(html, PAGE, &[]).as_deref(),
            Some("https://sec.test/news?page=2")
        );
        let html = r#"<a href="/archive">Older Posts</a>"#;
        assert_eq!(
            find_next_page_url(html, PAGE, &[]).as_deref(),
            Some("https://sec.test/archive")
        );
    }

    #[test]
    fn ignores_self_links_and_missing_links() {
        let html = r#"<a href="/news?page=1#top">Next</a>"#;
        assert_eq!(find_next_page_url(html, PAGE, &[]), None);
        assert_eq!(find_next_page_url("<p>end</p>", PAGE, &[]), None);
    }
}
