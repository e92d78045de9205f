//! Translation processor: runs one message through the pipeline.
//!
//! Flow:
//! 1. `iterations == 0`: moderation scores only. Toxic text becomes the
//!    unethical marker; anything else passes through untouched.
//! 2. `iterations > 0`: simplification loop, then ASL conversion if the loop
//!    succeeded.
//! 3. Sentiment, always. Skipped in favour of a fixed label when the text was
//!    already judged unethical.
//!
//! Every collaborator call is awaited before the next is issued; each stage
//! consumes the previous stage's output.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{Markers, PipelineConfig};
use crate::error::PipelineError;
use crate::pipeline::asl::{AslConverter, StopWords};
use crate::pipeline::rules::PhraseMatcher;
use crate::pipeline::sentiment::SentimentAnnotator;
use crate::pipeline::simplify::SimplificationEngine;
use crate::pipeline::toxicity::ToxicityClassifier;
use crate::pipeline::types::{ProcessingOutcome, ProcessingRequest};
use crate::services::{DetectSentiment, Generate, Score};

/// External capabilities the processor needs.
#[derive(Clone)]
pub struct PipelineDeps {
    pub llm: Arc<dyn Generate>,
    pub scorer: Arc<dyn Score>,
    pub sentiment: Arc<dyn DetectSentiment>,
}

pub struct TranslationProcessor {
    toxicity: Arc<ToxicityClassifier>,
    simplifier: SimplificationEngine,
    converter: AslConverter,
    annotator: SentimentAnnotator,
    markers: Markers,
}

impl TranslationProcessor {
    /// Wire every component from one configuration.
    pub fn new(config: &PipelineConfig, deps: PipelineDeps) -> Self {
        let toxicity = Arc::new(ToxicityClassifier::new(
            deps.scorer,
            PhraseMatcher::new("refusal", &config.refusal_phrases),
            config.thresholds.clone(),
        ));
        let simplifier = SimplificationEngine::new(
            Arc::clone(&deps.llm),
            Arc::clone(&toxicity),
            PhraseMatcher::new("uncertain", &config.uncertain_phrases),
            &config.prompts,
            config.markers.clone(),
        );
        let converter = AslConverter::new(
            deps.llm,
            config.prompts.clone(),
            StopWords::new(&config.stop_words),
        );
        let annotator =
            SentimentAnnotator::new(deps.sentiment, config.markers.shocked_sentiment.clone());

        Self {
            toxicity,
            simplifier,
            converter,
            annotator,
            markers: config.markers.clone(),
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Process a single request through the full pipeline.
    pub async fn process(
        &self,
        request: &ProcessingRequest,
    ) -> Result<ProcessingOutcome, PipelineError> {
        info!(
            iterations = request.iteration_count,
            chars = request.message.chars().count(),
            "Processing message"
        );

        let unethical = &self.markers.unethical;
        let default_tense = &self.markers.default_tense;

        let (simplified_text, asl_text, tense) = if request.iteration_count == 0 {
            let verdict = self
                .toxicity
                .classifier_check(&request.message)
                .await
                .map_err(PipelineError::Moderation)?;

            if verdict.is_toxic {
                (unethical.clone(), unethical.clone(), default_tense.clone())
            } else {
                debug!("No simplification requested, passing message through");
                (request.message.clone(), String::new(), default_tense.clone())
            }
        } else {
            let simplification = self
                .simplifier
                .simplify(&request.message, request.iteration_count)
                .await?;

            if simplification.succeeded {
                let conversion = self.converter.convert(&simplification.text).await?;
                (simplification.text, conversion.asl_text, conversion.tense)
            } else {
                let asl_text = if simplification.text == *unethical {
                    unethical.clone()
                } else {
                    String::new()
                };
                (simplification.text, asl_text, default_tense.clone())
            }
        };

        let known_unethical = simplified_text == *unethical;
        let sentiment = self
            .annotator
            .annotate(&request.message, known_unethical)
            .await?;

        let outcome = ProcessingOutcome {
            simplified_text,
            asl_text,
            tense,
            sentiment: sentiment.label,
        };
        info!(
            simplified = %outcome.simplified_text,
            asl = %outcome.asl_text,
            tense = %outcome.tense,
            sentiment = %outcome.sentiment,
            "Message processed"
        );
        Ok(outcome)
    }
}
