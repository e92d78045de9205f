//! Sentiment detection client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{DetectSentiment, post_json};
use crate::error::ServiceError;

const SERVICE: &str = "sentiment";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SentimentRequest<'a> {
    text: &'a str,
    language_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    sentiment: String,
}

/// Sentiment service reached over HTTP. Expects `{"sentiment": "POSITIVE"}`.
pub struct HttpSentimentClient {
    client: reqwest::Client,
    url: String,
    language_code: String,
}

impl HttpSentimentClient {
    pub fn new(url: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            language_code: language_code.into(),
        }
    }
}

#[async_trait]
impl DetectSentiment for HttpSentimentClient {
    async fn detect(&self, text: &str) -> Result<String, ServiceError> {
        let request = SentimentRequest {
            text,
            language_code: &self.language_code,
        };
        let response: SentimentResponse =
            post_json(&self.client, SERVICE, &self.url, &request).await?;

        let label = response.sentiment.trim();
        if label.is_empty() {
            return Err(ServiceError::invalid(SERVICE, "empty sentiment label"));
        }
        Ok(label.to_uppercase())
    }
}
