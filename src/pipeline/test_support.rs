//! Deterministic collaborator doubles for pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{LlmError, ServiceError};
use crate::services::{
    CategoryScores, DetectSentiment, Envelope, GenerateImage, GeneratedImage, Generate,
    ImageLocation, ImageRequest, ModerateImage, ModerationLabel, Publish, PublishOptions,
    PublishReceipt, Score,
};

/// Returns queued completions in order and records every prompt.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Generate for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "scripted".into(),
                reason: "script exhausted".into(),
            })
    }
}

/// Always fails.
pub struct FailingGenerator;

#[async_trait]
impl Generate for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::RequestFailed {
            provider: "failing".into(),
            reason: "connection refused".into(),
        })
    }
}

/// Scores `category` at `score` when the text contains `trigger`, else 0.
pub struct KeywordScorer {
    trigger: Option<String>,
    category: String,
    score: f32,
    calls: AtomicUsize,
}

impl KeywordScorer {
    pub fn new(trigger: &str, category: &str, score: f32) -> Self {
        Self {
            trigger: Some(trigger.to_lowercase()),
            category: category.into(),
            score,
            calls: AtomicUsize::new(0),
        }
    }

    /// Never flags anything.
    pub fn benign() -> Self {
        Self {
            trigger: None,
            category: "PROFANITY".into(),
            score: 0.0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Score for KeywordScorer {
    async fn score(&self, text: &str) -> Result<CategoryScores, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hit = self
            .trigger
            .as_ref()
            .is_some_and(|t| text.to_lowercase().contains(t.as_str()));
        let mut scores = CategoryScores::new();
        scores.insert(self.category.clone(), if hit { self.score } else { 0.01 });
        Ok(scores)
    }
}

/// Returns a fixed score table.
pub struct FixedScorer(pub CategoryScores);

#[async_trait]
impl Score for FixedScorer {
    async fn score(&self, _text: &str) -> Result<CategoryScores, ServiceError> {
        Ok(self.0.clone())
    }
}

pub struct FailingScorer;

#[async_trait]
impl Score for FailingScorer {
    async fn score(&self, _text: &str) -> Result<CategoryScores, ServiceError> {
        Err(ServiceError::RequestFailed {
            service: "moderation".into(),
            reason: "timeout".into(),
        })
    }
}

/// Returns a fixed label and records the texts it saw.
pub struct FixedSentiment {
    label: String,
    seen: Mutex<Vec<String>>,
}

impl FixedSentiment {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetectSentiment for FixedSentiment {
    async fn detect(&self, text: &str) -> Result<String, ServiceError> {
        self.seen.lock().unwrap().push(text.to_string());
        Ok(self.label.clone())
    }
}

/// Records envelopes; fails when `fail` is set.
#[derive(Default)]
pub struct RecordingPublisher {
    pub fail: bool,
    published: Mutex<Vec<(Envelope, PublishOptions)>>,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<(Envelope, PublishOptions)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publish for RecordingPublisher {
    async fn publish(
        &self,
        envelope: &Envelope,
        options: &PublishOptions,
    ) -> Result<PublishReceipt, ServiceError> {
        if self.fail {
            return Err(ServiceError::Status {
                service: "publisher".into(),
                status: 503,
                body: "unavailable".into(),
            });
        }
        let mut published = self.published.lock().unwrap();
        published.push((envelope.clone(), options.clone()));
        Ok(PublishReceipt {
            message_id: format!("msg-{}", published.len()),
            sequence_number: Some(published.len().to_string()),
        })
    }
}

/// Records image requests; optionally fails or never answers.
#[derive(Default)]
pub struct RecordingImageClient {
    pub fail: bool,
    pub hang: bool,
    requests: Mutex<Vec<ImageRequest>>,
}

impl RecordingImageClient {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerateImage for RecordingImageClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(ServiceError::RequestFailed {
                service: "image".into(),
                reason: "generation refused".into(),
            });
        }
        Ok(GeneratedImage {
            location: ImageLocation {
                bucket: "images".into(),
                key: format!("{}.jpeg", request.image_name),
            },
        })
    }
}

/// Returns fixed labels and records the locations it was asked about.
pub struct FixedImageModerator {
    labels: Vec<ModerationLabel>,
    seen: Mutex<Vec<ImageLocation>>,
}

impl FixedImageModerator {
    pub fn new(labels: Vec<ModerationLabel>) -> Self {
        Self {
            labels,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<ImageLocation> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModerateImage for FixedImageModerator {
    async fn moderation_labels(
        &self,
        location: &ImageLocation,
    ) -> Result<Vec<ModerationLabel>, ServiceError> {
        self.seen.lock().unwrap().push(location.clone());
        Ok(self.labels.clone())
    }
}
