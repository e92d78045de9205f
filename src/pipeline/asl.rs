//! Sign-language word-order conversion.
//!
//! Three chained generation calls:
//! 1. tense of the simplified text, reduced to letters only
//! 2. present-tense, non-plural, non-affixed rewrite of the simplified text
//! 3. verbs moved after objects, objects after subjects, applied to (2)
//!
//! followed by a stop-word filter that yields the gloss.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info};

use crate::config::Prompts;
use crate::error::PipelineError;
use crate::pipeline::types::AslConversion;
use crate::services::Generate;

pub struct AslConverter {
    llm: Arc<dyn Generate>,
    prompts: Prompts,
    stop_words: StopWords,
    non_alpha: Regex,
}

impl AslConverter {
    pub fn new(llm: Arc<dyn Generate>, prompts: Prompts, stop_words: StopWords) -> Self {
        Self {
            llm,
            prompts,
            stop_words,
            non_alpha: Regex::new(r"[^a-zA-Z]").expect("valid tense pattern"),
        }
    }

    /// Convert already-simplified text into a tense and a gloss.
    pub async fn convert(&self, simplified: &str) -> Result<AslConversion, PipelineError> {
        let raw_tense = self
            .llm
            .generate(&Prompts::render(&self.prompts.tense, simplified))
            .await?;
        let tense = self.non_alpha.replace_all(&raw_tense, "").into_owned();
        debug!(raw = %raw_tense, tense = %tense, "Tense extracted");

        let present = self
            .llm
            .generate(&Prompts::render(&self.prompts.present_tense, simplified))
            .await?;
        debug!(present = %present, "Present-tense rewrite");

        let reordered = self
            .llm
            .generate(&Prompts::render(&self.prompts.reorder, &present))
            .await?;
        debug!(reordered = %reordered, "Reordered rewrite");

        let asl_text = self.stop_words.filter(&reordered);
        info!(tense = %tense, asl_text = %asl_text, "ASL conversion complete");

        Ok(AslConversion { tense, asl_text })
    }
}

/// Words that carry no sign in the gloss.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Lowercase, strip surrounding periods, split on single spaces, drop
    /// stop-words, rejoin. Applying it twice gives the same string.
    pub fn filter(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let kept: Vec<&str> = lowered
            .trim_matches('.')
            .split(' ')
            .filter(|token| !self.contains(token.trim_matches('.')))
            .collect();
        kept.join(" ").trim_matches('.').to_string()
    }
}
