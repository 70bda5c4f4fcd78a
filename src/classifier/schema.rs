//! Response schema for the classification capability
//!
//! Raw gateway text is parsed into a tagged [`BatchOutcome`]: either one
//! validated analysis per input item, or `Malformed` carrying the raw text.
//! Nothing here panics or propagates on bad input.

use serde::Deserialize;

use crate::model::EventType;

/// Validated analysis for one item of a chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleAnalysis {
    /// Position of the item within its chunk
    pub index: usize,
    pub risk_score: u8,
    pub event_type: EventType,
    pub attacker: String,
    pub victim: String,
    pub vulnerabilities: Vec<String>,
    pub keywords: Vec<String>,
    pub confidence_score: f32,
    pub relevance_score: f32,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Analyses ordered by `index`, exactly one per input item
    Classified(Vec<ArticleAnalysis>),
    Malformed { reason: String, raw: String },
}

impl BatchOutcome {
    fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        Self::Malformed {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisRecord {
    index: usize,
    risk_score: f64,
    #[serde(default)]
    event_type: EventType,
    #[serde(default)]
    attacker: Option<String>,
    #[serde(default)]
    victim: Option<String>,
    #[serde(default)]
    vulnerabilities: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    confidence_score: f64,
    relevance_score: f64,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseShape {
    Wrapped { articles: Vec<AnalysisRecord> },
    Bare(Vec<AnalysisRecord>),
}

/// Strip markdown code fences some models wrap JSON in
#[must_use]
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn unit_interval(value: f64, field: &str, index: usize) -> Result<f32, String> {
    if (0.0..=1.0).contains(&value) {
        Ok(value as f32)
    } else {
        Err(format!("{field} {value} of item {index} is outside 0..=1"))
    }
}

fn validate(record: AnalysisRecord) -> Result<ArticleAnalysis, String> {
    let index = record.index;
    let risk = record.risk_score;
    if risk.fract() != 0.0 || !(0.0..=10.0).contains(&risk) {
        return Err(format!("riskScore {risk} of item {index} is not an integer in 0..=10"));
    }
    Ok(ArticleAnalysis {
        index,
        risk_score: risk as u8,
        event_type: record.event_type,
        attacker: or_unknown(record.attacker),
        victim: or_unknown(record.victim),
        vulnerabilities: record.vulnerabilities,
        keywords: record.keywords,
        confidence_score: unit_interval(record.confidence_score, "confidenceScore", index)?,
        relevance_score: unit_interval(record.relevance_score, "relevanceScore", index)?,
        summary: record.summary.trim().to_string(),
    })
}

/// Parse and validate a response for a chunk of `expected` items
#[must_use]
pub fn parse_response(raw: &str, expected: usize) -> BatchOutcome {
    let body = strip_code_blocks(raw);
    let records = match serde_json::from_str::<ResponseShape>(body) {
        Ok(ResponseShape::Wrapped { articles }) | Ok(ResponseShape::Bare(articles)) => articles,
        Err(e) => return BatchOutcome::malformed(format!("not a valid analysis document: {e}"), raw),
    };

    if records.len() != expected {
        return BatchOutcome::malformed(
            format!("expected {expected} analyses, got {}", records.len()),
            raw,
        );
    }

    let mut slots: Vec<Option<ArticleAnalysis>> = vec![None; expected];
    for record in records {
        let analysis = match validate(record) {
            Ok(a) => a,
            Err(reason) => return BatchOutcome::malformed(reason, raw),
        };
        let index = analysis.index;
        let Some(slot) = slots.get_mut(index) else {
            return BatchOutcome::malformed(format!("index {index} is out of range"), raw);
        };
        if slot.is_some() {
            return BatchOutcome::malformed(format!("item {index} analysed twice"), raw);
        }
        *slot = Some(analysis);
    }

    // Length matched and no index repeated, so every slot is filled
    BatchOutcome::Classified(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, risk: &str) -> String {
        format!(
            r#"{{"index":{index},"riskScore":{risk},"eventType":"DATA_BREACH","attacker":null,
                "victim":"Acme","vulnerabilities":["CVE-2024-1234"],"keywords":["breach"],
                "confidenceScore":0.9,"relevanceScore":0.8,"summary":"Acme leak"}}"#
        )
    }

    #[test]
    fn accepts_wrapped_and_fenced_responses() {
        let raw = format!(
            "```json\n{{\"articles\":[{},{}]}}\n```",
            record(1, "7"),
            record(0, "3")
        );
        let BatchOutcome::Classified(analyses) = parse_response(&raw, 2) else {
            panic!("expected classified outcome");
        };
        assert_eq!(analyses[0].index, 0);
        assert_eq!(analyses[0].risk_score, 3);
        assert_eq!(analyses[1].risk_score, 7);
        assert_eq!(analyses[0].attacker, "Unknown");
        assert_eq!(analyses[0].event_type, EventType::DataBreach);
    }

    #[test]
    fn accepts_bare_array() {
        let raw = format!("[{}]", record(0, "10"));
        assert!(matches!(parse_response(&raw, 1), BatchOutcome::Classified(_)));
    }

    #[test]
    fn rejects_schema_violations() {
        let cases = [
            ("Sorry, I cannot help with that.".to_string(), 1),
            ("{\"articles\":[".to_string(), 1),
            (format!("[{}]", record(0, "11")), 1),
            (format!("[{}]", record(0, "4.5")), 1),
            (format!("[{},{}]", record(0, "1"), record(0, "2")), 2),
            (format!("[{},{}]", record(0, "1"), record(5, "2")), 2),
            (format!("[{}]", record(0, "1")), 2),
        ];
        for (i, (raw, expected)) in cases.iter().enumerate() {
            match parse_response(raw, *expected) {
                BatchOutcome::Malformed { raw: kept, .. } => assert_eq!(&kept, raw),
                BatchOutcome::Classified(_) => panic!("case {i} should be malformed"),
            }
        }
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let raw = r#"[{"index":0,"riskScore":2,"confidenceScore":1.5,"relevanceScore":0.2}]"#;
        assert!(matches!(parse_response(raw, 1), BatchOutcome::Malformed { .. }));
    }
}
