//! OpenAI-compatible chat-completions gateway

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::ClassificationError;
use crate::model::FilteredContentItem;
use crate::utils::safe_truncate_chars;

use super::ClassifierGateway;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Characters of body text sent per item
const MAX_ITEM_CHARS: usize = 1_500;

const SYSTEM_PROMPT: &str = "You are a cyber threat intelligence analyst. For every numbered \
item, assess whether it describes a security event and answer with a JSON object \
{\"articles\": [...]} holding exactly one entry per item with the fields: index (the item \
number), riskScore (integer 0-10), eventType (one of CYBER_ATTACK, DATA_BREACH, \
MALWARE_CAMPAIGN, VULNERABILITY_DISCLOSURE, INCIDENT_RESPONSE, UNKNOWN), attacker, victim, \
vulnerabilities (list of CVE ids), keywords (list), confidenceScore (0-1), relevanceScore \
(0-1) and summary (one sentence). Answer with JSON only.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpClassifier {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpClassifier {
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ClassificationError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ClassificationError::Unavailable(format!("invalid API key: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn user_prompt(batch: &[FilteredContentItem]) -> String {
        let items: Vec<serde_json::Value> = batch
            .iter()
            .enumerate()
            .map(|(i, f)| {
                json!({
                    "index": i,
                    "title": f.item.title,
                    "url": f.item.url,
                    "content": safe_truncate_chars(&f.item.content, MAX_ITEM_CHARS),
                })
            })
            .collect();
        serde_json::to_string_pretty(&items).unwrap_or_default()
    }
}

#[async_trait]
impl ClassifierGateway for HttpClassifier {
    async fn classify(&self, batch: &[FilteredContentItem]) -> Result<String, ClassificationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(batch),
                },
            ],
            temperature: 0.0,
            response_format: json!({ "type": "json_object" }),
        };

        tracing::debug!(model = %self.model, items = batch.len(), "classification request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;
        let chat: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ClassificationError::Malformed {
                reason: format!("unexpected completion envelope: {e}"),
                raw: text.clone(),
            })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassificationError::Malformed {
                reason: "completion had no content".into(),
                raw: text,
            })
    }
}
