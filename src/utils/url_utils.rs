//! URL helpers for link resolution and duplicate detection.

use url::Url;

/// Query parameters that only carry tracking state and never change content
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid", "ref", "ref_src"];

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Resolve an `href` found on `base` into an absolute http(s) URL
///
/// Returns `None` for fragment-only links, non-http schemes and anything
/// that fails to parse.
#[must_use]
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("data:")
        || lowered.starts_with("tel:")
    {
        return None;
    }

    let base = Url::parse(base).ok()?;
    let joined = base.join(href).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Extract the registrable host of a URL, without a leading `www.`
#[must_use]
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Canonical form of a URL used in deduplication signatures
///
/// Lower-cases scheme and host, drops `www.`, fragments, default ports,
/// tracking parameters and trailing slashes, and sorts the remaining query
/// pairs. Unparseable input falls back to its trimmed lower-case form so the
/// function is total and idempotent.
#[must_use]
pub fn canonicalize_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url.trim()) else {
        return url.trim().to_lowercase();
    };

    parsed.set_fragment(None);

    if let Some(host) = parsed.host_str().map(str::to_owned)
        && let Some(stripped) = host.strip_prefix("www.")
    {
        let _ = parsed.set_host(Some(stripped));
    }

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| {
            let key = k.to_ascii_lowercase();
            !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    let mut out = parsed.to_string();
    if parsed.query().is_none() && parsed.path() == "/" && out.ends_with('/') {
        out.pop();
    }
    out
}
