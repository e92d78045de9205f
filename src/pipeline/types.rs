//! Shared types for the translation pipeline.
//!
//! Everything here is a request-scoped value: created during one call to
//! `TranslationProcessor::process` and dropped when it returns.

use serde::{Deserialize, Serialize};

// ── Request ─────────────────────────────────────────────────────────

/// One translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingRequest {
    pub message: String,
    /// Number of simplification rounds. `0` skips simplification entirely.
    pub iteration_count: u32,
}

impl ProcessingRequest {
    pub fn new(message: impl Into<String>, iteration_count: u32) -> Self {
        Self {
            message: message.into(),
            iteration_count,
        }
    }
}

/// Coerce an arbitrary JSON token into an iteration count.
///
/// Accepts a non-negative integer, a JSON number with no fractional part
/// (`2.0`), or a string holding an integer (surrounding whitespace allowed).
/// Everything else, negatives and fractions included, is `0`.
pub fn parse_iterations(token: &serde_json::Value) -> u32 {
    match token {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(v) => u32::try_from(v).unwrap_or(0),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                .map_or(0, |f| f as u32),
        },
        serde_json::Value::String(s) => s.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    }
}

// ── Simplification ──────────────────────────────────────────────────

/// How one simplification round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    FailedSimplification,
    ToxicDetected,
}

impl AttemptOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::FailedSimplification => "failed_simplification",
            Self::ToxicDetected => "toxic_detected",
        }
    }
}

/// One round of the simplification loop. Logged, not kept.
#[derive(Debug, Clone)]
pub struct SimplificationAttempt {
    pub iteration_index: u32,
    pub input_text: String,
    pub output_text: String,
    pub outcome: AttemptOutcome,
}

/// Result of the whole simplification loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simplification {
    /// Accepted text, or the fallback text when `succeeded` is false.
    pub text: String,
    pub succeeded: bool,
    /// Generation calls made.
    pub iterations_run: u32,
}

// ── Toxicity ────────────────────────────────────────────────────────

/// Which check produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    LexicalPattern,
    ExternalClassifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToxicityVerdict {
    pub is_toxic: bool,
    pub source: VerdictSource,
    /// Matched phrase (lexical) or breaching category (classifier).
    pub category: Option<String>,
    pub score: Option<f32>,
}

impl ToxicityVerdict {
    pub fn clean(source: VerdictSource) -> Self {
        Self {
            is_toxic: false,
            source,
            category: None,
            score: None,
        }
    }
}

// ── ASL / sentiment / outcome ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AslConversion {
    pub tense: String,
    pub asl_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentResult {
    pub label: String,
}

/// Final pipeline output, handed to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOutcome {
    pub simplified_text: String,
    pub asl_text: String,
    pub tense: String,
    pub sentiment: String,
}
