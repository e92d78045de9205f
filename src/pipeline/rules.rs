//! Phrase rules for recognizing canned model answers.
//!
//! The generation service answers some prompts with a refusal ("I cannot
//! provide that type of ...") or a request for more context instead of doing
//! the work. These are recognized by case-insensitive substring match against
//! an ordered phrase list supplied at construction.

use tracing::debug;

/// Ordered, case-insensitive substring matcher.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    name: &'static str,
    /// Lowercased phrases, in configured order.
    phrases: Vec<String>,
}

impl PhraseMatcher {
    /// Build a matcher. `name` only shows up in logs.
    pub fn new<I, S>(name: &'static str, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { name, phrases }
    }

    /// A matcher that never matches (for testing).
    pub fn empty(name: &'static str) -> Self {
        Self {
            name,
            phrases: Vec::new(),
        }
    }

    /// First configured phrase contained in `text`, if any.
    pub fn find(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        let found = self
            .phrases
            .iter()
            .find(|phrase| haystack.contains(phrase.as_str()))
            .map(String::as_str);

        if let Some(phrase) = found {
            debug!(matcher = self.name, phrase = %phrase, "Phrase rule matched");
        }
        found
    }

    pub fn matches(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}
