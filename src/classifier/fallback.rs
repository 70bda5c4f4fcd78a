//! Deterministic keyword heuristic applied when a chunk cannot be classified

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{ClassificationSource, EventType, FilteredContentItem, ProcessedArticle};
use crate::utils::safe_truncate_chars;

static CVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bCVE-\d{4}-\d{4,7}\b").expect("BUG: hardcoded CVE regex is invalid")
});

/// Checked in order; the first matching group decides the event type
const EVENT_KEYWORDS: &[(EventType, &[&str])] = &[
    (EventType::MalwareCampaign, &["ransomware", "malware", "trojan", "botnet"]),
    (EventType::DataBreach, &["breach", "leak", "exposed data", "stolen data"]),
    (EventType::VulnerabilityDisclosure, &["cve-", "vulnerability", "zero-day", "0-day", "patch"]),
    (EventType::CyberAttack, &["attack", "ddos", "hack", "compromise"]),
    (EventType::IncidentResponse, &["incident", "response", "investigation", "forensic"]),
];

const NEUTRAL_RISK_SCORE: u8 = 5;
const SUMMARY_CHARS: usize = 200;

#[must_use]
pub fn infer_event_type(text: &str) -> EventType {
    let lowered = text.to_lowercase();
    EVENT_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map_or(EventType::Unknown, |(kind, _)| *kind)
}

/// Unique upper-cased CVE ids in order of first appearance
#[must_use]
pub fn extract_cves(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in CVE_PATTERN.find_iter(text) {
        let id = m.as_str().to_uppercase();
        if !found.contains(&id) {
            found.push(id);
        }
    }
    found
}

/// Generic article with placeholder attribution and a neutral risk score
#[must_use]
pub fn fallback_article(item: &FilteredContentItem) -> ProcessedArticle {
    let text = item.item.classification_text();
    ProcessedArticle {
        item: item.clone(),
        risk_score: NEUTRAL_RISK_SCORE,
        event_type: infer_event_type(&text),
        attacker: "Unknown".to_string(),
        victim: "Unknown".to_string(),
        vulnerabilities: extract_cves(&text),
        keywords: vec!["unclassified".to_string()],
        confidence_score: 0.0,
        relevance_score: 0.0,
        summary: safe_truncate_chars(&text, SUMMARY_CHARS).to_string(),
        classification_source: ClassificationSource::Fallback,
    }
}
