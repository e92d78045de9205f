//! Hands processed outcomes and control actions to the avatar bus.
//!
//! A translated sentence is published as an `ANIMATE_SENTENCE` envelope.
//! Unless the sentence was judged unethical, an illustrative image is then
//! requested on a background task; that request is best-effort and only
//! logged, and the publish receipt never waits for it.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ImageStyle;
use crate::error::PipelineError;
use crate::pipeline::types::ProcessingOutcome;
use crate::services::{
    Action, Envelope, GenerateImage, ImageModerationVerdict, ImageParameters, ImageRequest,
    ModerateImage, Publish, PublishOptions, PublishReceipt,
};

pub struct Dispatcher {
    publisher: Arc<dyn Publish>,
    images: Option<Arc<dyn GenerateImage>>,
    image_moderator: Option<Arc<dyn ModerateImage>>,
    style: ImageStyle,
    unethical_marker: String,
}

impl Dispatcher {
    pub fn new(
        publisher: Arc<dyn Publish>,
        style: ImageStyle,
        unethical_marker: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            images: None,
            image_moderator: None,
            style,
            unethical_marker: unethical_marker.into(),
        }
    }

    pub fn with_images(mut self, images: Arc<dyn GenerateImage>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_image_moderator(mut self, moderator: Arc<dyn ModerateImage>) -> Self {
        self.image_moderator = Some(moderator);
        self
    }

    /// Publish a translation outcome, then request an image for it.
    pub async fn dispatch(
        &self,
        outcome: &ProcessingOutcome,
    ) -> Result<PublishReceipt, PipelineError> {
        let receipt = self.send(animation_envelope(outcome)).await?;

        if outcome.simplified_text != self.unethical_marker {
            self.spawn_image_request(&outcome.simplified_text);
        }

        Ok(receipt)
    }

    pub async fn change_avatar(&self, avatar: &str) -> Result<PublishReceipt, PipelineError> {
        self.send(Envelope::new(Action::ChangeAvatar).with_data(avatar))
            .await
    }

    pub async fn change_sign_rate(&self, rate: &str) -> Result<PublishReceipt, PipelineError> {
        self.send(Envelope::new(Action::ChangeSignRate).with_data(rate))
            .await
    }

    pub async fn stop_all(&self) -> Result<PublishReceipt, PipelineError> {
        self.send(Envelope::new(Action::StopAllAnimations)).await
    }

    async fn send(&self, envelope: Envelope) -> Result<PublishReceipt, PipelineError> {
        let options = PublishOptions::fresh(envelope.action);
        self.publisher
            .publish(&envelope, &options)
            .await
            .map_err(PipelineError::Publish)
    }

    /// Image request for a simplified sentence, named after the current time.
    pub fn image_request(&self, simplified_text: &str) -> ImageRequest {
        ImageRequest {
            image_name: format!("{}_{}", self.style.name_prefix, Utc::now().timestamp()),
            input_text: format!("{} {}", simplified_text, self.style.description_suffix),
            parameters: ImageParameters {
                cfg_scale: self.style.cfg_scale,
                seed: self.style.seed,
                steps: self.style.steps,
            },
        }
    }

    /// Start the image side request in the background.
    ///
    /// `None` when no image client is configured.
    pub fn spawn_image_request(&self, simplified_text: &str) -> Option<JoinHandle<()>> {
        let images = Arc::clone(self.images.as_ref()?);
        let moderator = self.image_moderator.clone();
        let request = self.image_request(simplified_text);
        let threshold = self.style.moderation_threshold;
        Some(tokio::spawn(request_image(
            images, moderator, request, threshold,
        )))
    }
}

async fn request_image(
    images: Arc<dyn GenerateImage>,
    moderator: Option<Arc<dyn ModerateImage>>,
    request: ImageRequest,
    moderation_threshold: f32,
) {
    info!(image_name = %request.image_name, prompt = %request.input_text, "Requesting image");

    let image = match images.generate_image(&request).await {
        Ok(image) => image,
        Err(e) => {
            warn!(error = %e, "Image generation failed");
            return;
        }
    };
    info!(bucket = %image.location.bucket, key = %image.location.key, "Image generated");

    let Some(moderator) = moderator else {
        return;
    };
    match moderator.moderation_labels(&image.location).await {
        Ok(labels) => {
            let verdict = ImageModerationVerdict::from_labels(&labels, moderation_threshold);
            if verdict.is_toxic {
                warn!(
                    key = %image.location.key,
                    label = ?verdict.label,
                    confidence = verdict.confidence,
                    "Generated image flagged by moderation"
                );
            } else {
                info!(key = %image.location.key, "Generated image passed moderation");
            }
        }
        Err(e) => warn!(error = %e, "Image moderation failed"),
    }
}

/// `ANIMATE_SENTENCE` envelope for an outcome.
pub fn animation_envelope(outcome: &ProcessingOutcome) -> Envelope {
    Envelope::new(Action::AnimateSentence)
        .with_data(outcome.simplified_text.clone())
        .with_kwarg("sentiment", outcome.sentiment.clone())
        .with_kwarg("asl_text", outcome.asl_text.clone())
        .with_kwarg("tense", outcome.tense.clone())
}
