//! Message translation pipeline.
//!
//! A message flows through:
//! 1. `ToxicityClassifier`: refusal phrases (no I/O) and moderation scores
//! 2. `SimplificationEngine`: bounded rewrite loop gated by (1)
//! 3. `AslConverter`: tense, present-tense rewrite, sign order, stop-words
//! 4. `SentimentAnnotator`: label for the avatar's expression
//!
//! `TranslationProcessor` sequences these; `Dispatcher` publishes the result.
//!
//! **Canned model answers are outcomes, not errors.** They become marker
//! text; only collaborator faults abort a request.

pub mod asl;
pub mod dispatch;
pub mod processor;
pub mod rules;
pub mod sentiment;
pub mod simplify;
pub mod toxicity;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatch::Dispatcher;
pub use processor::{PipelineDeps, TranslationProcessor};
pub use types::{ProcessingOutcome, ProcessingRequest, parse_iterations};
