//! Sentiment labelling with a short-circuit for unethical text.

use std::sync::Arc;

use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::types::SentimentResult;
use crate::services::DetectSentiment;

pub struct SentimentAnnotator {
    detector: Arc<dyn DetectSentiment>,
    /// Label used once the text is already known to be unethical.
    shocked_label: String,
}

impl SentimentAnnotator {
    pub fn new(detector: Arc<dyn DetectSentiment>, shocked_label: impl Into<String>) -> Self {
        Self {
            detector,
            shocked_label: shocked_label.into(),
        }
    }

    /// Label the ORIGINAL message. Skips the service when `known_unethical`.
    pub async fn annotate(
        &self,
        original_message: &str,
        known_unethical: bool,
    ) -> Result<SentimentResult, PipelineError> {
        if known_unethical {
            debug!("Message already unethical, skipping sentiment detection");
            return Ok(SentimentResult {
                label: self.shocked_label.clone(),
            });
        }

        let label = self
            .detector
            .detect(original_message)
            .await
            .map_err(PipelineError::Sentiment)?;
        debug!(label = %label, "Sentiment detected");
        Ok(SentimentResult { label })
    }
}
