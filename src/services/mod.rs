//! Capabilities the pipeline consumes, plus HTTP clients implementing them.
//!
//! The pipeline only ever sees the narrow traits below. Concrete clients are
//! thin JSON-over-HTTP adapters; tests substitute in-memory doubles.

pub mod image;
pub mod moderation;
pub mod publisher;
pub mod sentiment;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{LlmError, ServiceError};

pub use image::{
    GeneratedImage, HttpImageClient, HttpImageModerationClient, ImageLocation,
    ImageModerationVerdict, ImageParameters, ImageRequest, ModerationLabel,
};
pub use moderation::{CategoryScores, HttpModerationClient};
pub use publisher::{
    Action, Envelope, HttpPublisher, LogPublisher, PublishOptions, PublishReceipt,
};
pub use sentiment::HttpSentimentClient;

/// Text generation: one prompt in, one cleaned completion out.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Content moderation: per-category scores for a text.
#[async_trait]
pub trait Score: Send + Sync {
    async fn score(&self, text: &str) -> Result<CategoryScores, ServiceError>;
}

/// Sentiment detection: the top sentiment label for a text.
#[async_trait]
pub trait DetectSentiment: Send + Sync {
    async fn detect(&self, text: &str) -> Result<String, ServiceError>;
}

/// Message bus publisher. Builds nothing itself; delivery guarantees are the
/// bus's concern.
#[async_trait]
pub trait Publish: Send + Sync {
    async fn publish(
        &self,
        envelope: &Envelope,
        options: &PublishOptions,
    ) -> Result<PublishReceipt, ServiceError>;
}

/// Image generation side request.
#[async_trait]
pub trait GenerateImage: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, ServiceError>;
}

/// Moderation labels for a stored image.
#[async_trait]
pub trait ModerateImage: Send + Sync {
    async fn moderation_labels(
        &self,
        location: &ImageLocation,
    ) -> Result<Vec<ModerationLabel>, ServiceError>;
}

/// POST `body` as JSON to `url` and decode a JSON response.
pub(crate) async fn post_json<B, R>(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    body: &B,
) -> Result<R, ServiceError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| ServiceError::request(service, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status {
            service: service.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<R>()
        .await
        .map_err(|e| ServiceError::invalid(service, e))
}
