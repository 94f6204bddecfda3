//! Summarizer bindings for Rust
//! Sends a window of news items to an external summarizer service and returns its answer

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("Summarizer returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
}

/// One news item as the summarizer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub id: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub published_datetime: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub items: Vec<SummaryItem>,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    summary: String,
}

/// Free text answer, plus the parsed JSON when the service answered with JSON
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResponse {
    pub text: String,
    pub structured: Option<serde_json::Value>,
}

impl SummaryResponse {
    /// Accepts `{"summary": "..."}`, any other JSON document, or plain text
    pub fn from_body(body: String) -> Self {
        if let Ok(parsed) = serde_json::from_str::<SummaryBody>(&body) {
            let structured = serde_json::from_str(&body).ok();
            return Self {
                text: parsed.summary,
                structured,
            };
        }

        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) => Self {
                text: body,
                structured: Some(value),
            },
            Err(_) => Self {
                text: body,
                structured: None,
            },
        }
    }
}

pub struct SummarizerClient {
    url: String,
    client: Client,
}

impl SummarizerClient {
    pub fn new(url: &str, token: Option<&str>) -> Result<Self, SummarizerError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                HeaderName::from_static("authorization"),
                HeaderValue::from_str(token).map_err(|_| SummarizerError::InvalidHeader)?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/summarize", self.url)
    }

    /// Send items to the summarizer and wait for its answer
    pub fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse, SummarizerError> {
        let response = self.client.post(self.endpoint()).json(request).send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(SummarizerError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(SummaryResponse::from_body(body))
    }
}
