use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which extraction rule produced a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Link,
    Article,
    Headline,
    Clickable,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Article,
        ContentKind::Headline,
        ContentKind::Link,
        ContentKind::Clickable,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Article => "article",
            Self::Headline => "headline",
            Self::Clickable => "clickable",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted candidate fragment, before filtering
///
/// Immutable once created. `(source_page, selector, index)` identifies the
/// fragment for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContentItem {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub url: String,
    pub content: String,
    pub index: usize,
    /// Seed URL the crawl started from
    pub source_url: String,
    pub crawled_date: DateTime<Utc>,
    pub page_number: usize,
    pub content_length: usize,
    /// Page the fragment was found on (differs from `source_url` after pagination)
    pub source_page: String,
    pub selector: String,
}

impl RawContentItem {
    /// Stable identity of the fragment within a session
    #[must_use]
    pub fn identity(&self) -> (&str, &str, usize) {
        (&self.source_page, &self.selector, self.index)
    }

    /// Text handed to the classifier: title followed by body when they differ
    #[must_use]
    pub fn classification_text(&self) -> String {
        if self.content.is_empty() || self.content == self.title {
            self.title.clone()
        } else if self.title.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n{}", self.title, self.content)
        }
    }
}

/// A raw item that survived quality and duplicate checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredContentItem {
    #[serde(flatten)]
    pub item: RawContentItem,
    /// Normalized title + canonical URL signature used for deduplication
    pub signature: String,
}

/// Threat category assigned by classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    CyberAttack,
    DataBreach,
    MalwareCampaign,
    VulnerabilityDisclosure,
    IncidentResponse,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EventType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CyberAttack => "CYBER_ATTACK",
            Self::DataBreach => "DATA_BREACH",
            Self::MalwareCampaign => "MALWARE_CAMPAIGN",
            Self::VulnerabilityDisclosure => "VULNERABILITY_DISCLOSURE",
            Self::IncidentResponse => "INCIDENT_RESPONSE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an article's analysis came from the AI capability or the fallback heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Ai,
    Fallback,
}

/// A filtered item plus its threat analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedArticle {
    #[serde(flatten)]
    pub item: FilteredContentItem,
    /// 0-10
    pub risk_score: u8,
    pub event_type: EventType,
    pub attacker: String,
    pub victim: String,
    pub vulnerabilities: Vec<String>,
    pub keywords: Vec<String>,
    pub confidence_score: f32,
    pub relevance_score: f32,
    pub summary: String,
    pub classification_source: ClassificationSource,
}

impl ProcessedArticle {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.classification_source == ClassificationSource::Fallback
    }
}

/// Outcome of handing processed articles to the persistence gateway
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSaveResult {
    pub articles_saved: usize,
    pub analyses_saved: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl DatabaseSaveResult {
    /// Result describing a save call that failed outright
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            articles_saved: 0,
            analyses_saved: 0,
            errors: vec![error.into()],
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
