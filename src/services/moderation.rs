//! Text moderation client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Score, post_json};
use crate::error::ServiceError;

const SERVICE: &str = "moderation";

/// Category name → score in `[0, 1]`. Ordered so iteration is deterministic.
pub type CategoryScores = BTreeMap<String, f32>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModerationRequest<'a> {
    text: &'a str,
    language_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    #[serde(default)]
    labels: Vec<LabelScore>,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    name: String,
    score: f32,
}

impl ModerationResponse {
    fn into_scores(self) -> CategoryScores {
        self.labels
            .into_iter()
            .map(|label| (label.name, label.score))
            .collect()
    }
}

/// Moderation service reached over HTTP.
///
/// Sends `{"text", "languageCode"}` and expects `{"labels": [{"name", "score"}]}`.
pub struct HttpModerationClient {
    client: reqwest::Client,
    url: String,
    language_code: String,
}

impl HttpModerationClient {
    pub fn new(url: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            language_code: language_code.into(),
        }
    }
}

#[async_trait]
impl Score for HttpModerationClient {
    async fn score(&self, text: &str) -> Result<CategoryScores, ServiceError> {
        let request = ModerationRequest {
            text,
            language_code: &self.language_code,
        };
        let response: ModerationResponse =
            post_json(&self.client, SERVICE, &self.url, &request).await?;
        let scores = response.into_scores();
        debug!(categories = scores.len(), "Moderation scores received");
        Ok(scores)
    }
}
