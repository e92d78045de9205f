//! Bounded iterative simplification.
//!
//! Each round asks the generation service to shorten the current text. A
//! round can end three ways:
//! - the answer is a canned "I need more context" reply: stop. On the first
//!   round the text becomes the unknown marker, on later rounds it rolls back
//!   to the last accepted answer.
//! - the answer is toxic: stop, text becomes the unethical marker.
//! - otherwise the answer is accepted and feeds the next round.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{Markers, Prompts};
use crate::error::PipelineError;
use crate::pipeline::rules::PhraseMatcher;
use crate::pipeline::toxicity::ToxicityClassifier;
use crate::pipeline::types::{AttemptOutcome, Simplification, SimplificationAttempt};
use crate::services::Generate;

pub struct SimplificationEngine {
    llm: Arc<dyn Generate>,
    toxicity: Arc<ToxicityClassifier>,
    uncertain: PhraseMatcher,
    prompt: String,
    markers: Markers,
}

impl SimplificationEngine {
    pub fn new(
        llm: Arc<dyn Generate>,
        toxicity: Arc<ToxicityClassifier>,
        uncertain: PhraseMatcher,
        prompts: &Prompts,
        markers: Markers,
    ) -> Self {
        Self {
            llm,
            toxicity,
            uncertain,
            prompt: prompts.simplification.clone(),
            markers,
        }
    }

    /// Run at most `max_iterations` rounds starting from `text`.
    pub async fn simplify(
        &self,
        text: &str,
        max_iterations: u32,
    ) -> Result<Simplification, PipelineError> {
        let mut current = text.to_string();
        let mut last_good = text.to_string();

        for i in 0..max_iterations {
            let prompt = Prompts::render(&self.prompt, &current);
            let output = self.llm.generate(&prompt).await?;

            let outcome = if self.uncertain.matches(&output) {
                AttemptOutcome::FailedSimplification
            } else if self
                .toxicity
                .classify(&output)
                .await
                .map_err(PipelineError::Moderation)?
                .is_toxic
            {
                AttemptOutcome::ToxicDetected
            } else {
                AttemptOutcome::Success
            };

            let attempt = SimplificationAttempt {
                iteration_index: i,
                input_text: current.clone(),
                output_text: output.clone(),
                outcome,
            };
            debug!(
                iteration = attempt.iteration_index + 1,
                input = %attempt.input_text,
                output = %attempt.output_text,
                outcome = attempt.outcome.label(),
                "Simplification round"
            );

            match outcome {
                AttemptOutcome::Success => {
                    last_good = output.clone();
                    current = output;
                }
                AttemptOutcome::FailedSimplification => {
                    let text = if i == 0 {
                        self.markers.unknown.clone()
                    } else {
                        last_good
                    };
                    warn!(iteration = i + 1, "Simplification not understood, stopping");
                    return Ok(Simplification {
                        text,
                        succeeded: false,
                        iterations_run: i + 1,
                    });
                }
                AttemptOutcome::ToxicDetected => {
                    warn!(iteration = i + 1, "Toxic simplification, stopping");
                    return Ok(Simplification {
                        text: self.markers.unethical.clone(),
                        succeeded: false,
                        iterations_run: i + 1,
                    });
                }
            }
        }

        info!(iterations = max_iterations, text = %current, "Simplification complete");
        Ok(Simplification {
            text: current,
            succeeded: true,
            iterations_run: max_iterations,
        })
    }
}
