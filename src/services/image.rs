//! Image generation and image moderation clients.
//!
//! Neither feeds back into the text pipeline: a generated image is a side
//! effect of a successful translation, and its moderation verdict is only
//! logged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GenerateImage, ModerateImage, post_json};
use crate::error::ServiceError;

/// Sampling parameters forwarded to the image model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageParameters {
    pub cfg_scale: f32,
    pub seed: u64,
    pub steps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    /// Storage key stem; the collaborator appends its own extension.
    pub image_name: String,
    pub input_text: String,
    pub parameters: ImageParameters,
}

/// Where a generated image was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLocation {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub location: ImageLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationLabel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    pub confidence: f32,
}

/// Toxicity verdict over a generated image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageModerationVerdict {
    pub is_toxic: bool,
    /// Confidence of the first label over the threshold.
    pub confidence: f32,
    pub label: Option<String>,
}

impl ImageModerationVerdict {
    /// Toxic when any label's confidence is strictly above `threshold`.
    pub fn from_labels(labels: &[ModerationLabel], threshold: f32) -> Self {
        match labels.iter().find(|l| l.confidence > threshold) {
            Some(label) => Self {
                is_toxic: true,
                confidence: label.confidence,
                label: Some(label.name.clone()),
            },
            None => Self {
                is_toxic: false,
                confidence: 0.0,
                label: None,
            },
        }
    }
}

/// Image generator reached over HTTP. Returns `{"location": {"bucket", "key"}}`.
pub struct HttpImageClient {
    client: reqwest::Client,
    url: String,
}

impl HttpImageClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl GenerateImage for HttpImageClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, ServiceError> {
        post_json(&self.client, "image", &self.url, request).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelsResponse {
    #[serde(default)]
    moderation_labels: Vec<ModerationLabel>,
}

/// Image moderation reached over HTTP. Returns `{"moderationLabels": [...]}`.
pub struct HttpImageModerationClient {
    client: reqwest::Client,
    url: String,
}

impl HttpImageModerationClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ModerateImage for HttpImageModerationClient {
    async fn moderation_labels(
        &self,
        location: &ImageLocation,
    ) -> Result<Vec<ModerationLabel>, ServiceError> {
        let response: LabelsResponse =
            post_json(&self.client, "image-moderation", &self.url, location).await?;
        Ok(response.moderation_labels)
    }
}
