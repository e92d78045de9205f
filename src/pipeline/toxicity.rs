//! Toxicity gate: refusal-phrase match first, moderation scores second.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ToxicityThresholds;
use crate::error::ServiceError;
use crate::pipeline::rules::PhraseMatcher;
use crate::pipeline::types::{ToxicityVerdict, VerdictSource};
use crate::services::Score;

/// Combines the lexical refusal matcher with the external moderation service.
pub struct ToxicityClassifier {
    scorer: Arc<dyn Score>,
    refusals: PhraseMatcher,
    thresholds: ToxicityThresholds,
}

impl ToxicityClassifier {
    pub fn new(
        scorer: Arc<dyn Score>,
        refusals: PhraseMatcher,
        thresholds: ToxicityThresholds,
    ) -> Self {
        Self {
            scorer,
            refusals,
            thresholds,
        }
    }

    /// Refusal-phrase check. No I/O, never fails.
    ///
    /// Returns `Some` only when a phrase matched.
    pub fn lexical_check(&self, text: &str) -> Option<ToxicityVerdict> {
        self.refusals.find(text).map(|phrase| ToxicityVerdict {
            is_toxic: true,
            source: VerdictSource::LexicalPattern,
            category: Some(phrase.to_string()),
            score: None,
        })
    }

    /// Moderation-service check. Toxic when any category meets its threshold.
    ///
    /// Service failures propagate; the caller decides what a failed check means.
    pub async fn classifier_check(&self, text: &str) -> Result<ToxicityVerdict, ServiceError> {
        let scores = self.scorer.score(text).await?;

        for (category, &score) in &scores {
            let threshold = self.thresholds.threshold_for(category);
            debug!(category = %category, score, threshold, "Moderation category");
            if score >= threshold {
                info!(category = %category, score, threshold, "Moderation threshold breached");
                return Ok(ToxicityVerdict {
                    is_toxic: true,
                    source: VerdictSource::ExternalClassifier,
                    category: Some(category.clone()),
                    score: Some(score),
                });
            }
        }

        Ok(ToxicityVerdict::clean(VerdictSource::ExternalClassifier))
    }

    /// Lexical check, then classifier check if the lexical one passed.
    pub async fn classify(&self, text: &str) -> Result<ToxicityVerdict, ServiceError> {
        if let Some(verdict) = self.lexical_check(text) {
            info!(phrase = ?verdict.category, "Refusal phrase detected");
            return Ok(verdict);
        }
        self.classifier_check(text).await
    }
}
