//! Configuration types.
//!
//! `PipelineConfig` holds every tunable the pipeline components read:
//! markers, phrase lists, thresholds, prompts, stop-words and generation
//! parameters. It is built once at startup and shared behind an `Arc`; no
//! component reads process-wide constants.

use std::collections::BTreeMap;
use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Placeholder substituted with the text a prompt operates on.
pub const PROMPT_TEXT_PLACEHOLDER: &str = "{text}";

/// Immutable configuration for the translation pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub markers: Markers,
    /// Generation-service non-answers that mean the text was judged unethical.
    pub refusal_phrases: Vec<String>,
    /// Generation-service answers that mean the simplification did not happen.
    pub uncertain_phrases: Vec<String>,
    pub thresholds: ToxicityThresholds,
    pub prompts: Prompts,
    /// Words dropped from the final gloss.
    pub stop_words: Vec<String>,
    pub generation: GenerationParams,
    pub image: ImageStyle,
    /// Language code passed to moderation and sentiment services.
    pub language_code: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            markers: Markers::default(),
            refusal_phrases: to_strings(&[
                "do not wish to",
                "thoughtless remark",
                "Let's move our conversation",
                "I cannot provide that type",
                "harmful or unethical",
                "I cannot provide a simplified",
                "not feel comfortable",
                "in the way you requested",
                "I apologize,",
                "offensive stereotype",
                "refrain from simplifying",
                "I do not feel comfortable",
                "in the manner you requested",
            ]),
            uncertain_phrases: to_strings(&[
                "have enough context",
                "provide more details",
                "you are asking me to do",
                "AI assistant",
                "created by Anthropic",
                "not actually simplify sentences",
                "Unfortunately I do not have any",
                "thoughtful discussion about the",
                "without simplifying them",
                "do not have the capability",
                "to be helpful, harmless, and honest",
                "you would like me to simplify",
                "Could you provide some example",
            ]),
            thresholds: ToxicityThresholds::default(),
            prompts: Prompts::default(),
            stop_words: to_strings(&[
                "as", "although", "be", "for", "and", "nor", "but", "or", "yet", "so", "about",
                "above", "across", "after", "against", "along", "among", "around", "at",
                "before", "behind", "because", "below", "beneath", "beside", "between",
                "beyond", "by", "down", "during", "except", "from", "if", "lest", "once",
                "then", "that", "though", "till", "when", "where", "in", "inside", "into",
                "near", "of", "off", "on", "over", "past", "since", "through", "throughout",
                "to", "toward", "under", "until", "up", "upon", "with", "within", "without",
                "a", "an", "the", "am", "is", "are", "was", "were",
            ]),
            generation: GenerationParams::default(),
            image: ImageStyle::default(),
            language_code: "en".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load overrides from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            ConfigError::ParseError(format!("{}: {e}", path.display()))
        })
    }

    /// Load from the file named by `ASL_RELAY_PIPELINE_CONFIG`, or defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("ASL_RELAY_PIPELINE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }
}

/// Fixed fallback values substituted into the outcome.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Replaces text that was judged unethical.
    pub unethical: String,
    /// Replaces text the first simplification could not handle.
    pub unknown: String,
    /// Sentiment reported for unethical text.
    pub shocked_sentiment: String,
    /// Tense reported whenever ASL conversion does not run.
    pub default_tense: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            unethical: "Pay Attention! Unethical Input.".to_string(),
            unknown: "Please Repeat Again!".to_string(),
            shocked_sentiment: "SHOCKED".to_string(),
            default_tense: "present".to_string(),
        }
    }
}

/// Per-category toxicity thresholds. A category scores toxic at or above its
/// threshold; categories without an entry use `general`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToxicityThresholds {
    pub general: f32,
    pub per_category: BTreeMap<String, f32>,
}

impl ToxicityThresholds {
    pub fn threshold_for(&self, category: &str) -> f32 {
        self.per_category
            .get(category)
            .copied()
            .unwrap_or(self.general)
    }
}

impl Default for ToxicityThresholds {
    fn default() -> Self {
        let general = 0.3;
        let per_category = [
            ("GRAPHIC", general),
            ("HARASSMENT_OR_ABUSE", general),
            ("HATE_SPEECH", 0.24),
            ("INSULT", 0.5),
            ("PROFANITY", general),
            ("SEXUAL", 0.55),
            ("VIOLENCE_OR_THREAT", general),
        ]
        .into_iter()
        .map(|(name, threshold)| (name.to_string(), threshold))
        .collect();

        Self {
            general,
            per_category,
        }
    }
}

/// Prompt templates. Each contains `{text}` once.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub simplification: String,
    pub tense: String,
    pub present_tense: String,
    pub reorder: String,
}

impl Prompts {
    /// Substitute `text` into a template.
    pub fn render(template: &str, text: &str) -> String {
        template.replace(PROMPT_TEXT_PLACEHOLDER, text)
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            simplification: "Simplify into English using the same original tense for these \
                sentences (after the colon) into one shortened English sentence using \
                non-hyphenated non-polysemous non-contracted words and remove all contracted \
                words and apostrophes in the resulting sentence. Keep main subject.:\"{text}\""
                .to_string(),
            tense: "Provide the tense (present, past, or future) in one word of the \
                following:\"{text}\""
                .to_string(),
            present_tense: "Use only the present tense for the provided text (after the colon) \
                and provide a combined sentence. Make all words non-plural. Do not repeat \
                sentences. Make all words non-affixed words and remove ed-endings and remove \
                ing-endings. Include all provided subjects.:\"{text}\""
                .to_string(),
            reorder: "put the verbs after all objects after all main subjects in the following \
                text:\"{text}\""
                .to_string(),
        }
    }
}

/// Sampling parameters for every text-generation call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub max_tokens: u64,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.7,
            top_p: 0.65,
            top_k: 80,
            stop_sequences: vec!["\n\nHuman:".to_string()],
        }
    }
}

/// Style settings for the side image request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageStyle {
    pub name_prefix: String,
    pub description_suffix: String,
    pub cfg_scale: f32,
    pub seed: u64,
    pub steps: u32,
    /// Image moderation flags a label whose confidence exceeds this.
    pub moderation_threshold: f32,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            name_prefix: "aslImage".to_string(),
            description_suffix: "photorealistic, painted, 8k quality".to_string(),
            cfg_scale: 4.4,
            seed: 416_330_048,
            steps: 34,
            moderation_threshold: 0.30,
        }
    }
}

/// Endpoints and credentials for the collaborators, read from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub llm: LlmConfig,
    pub moderation_url: String,
    pub sentiment_url: String,
    /// Publisher endpoint. `None` logs envelopes instead of sending them.
    pub publisher_url: Option<String>,
    pub topic: String,
    pub image_url: Option<String>,
    pub image_moderation_url: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("ASL_RELAY_LLM_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("ASL_RELAY_LLM_API_KEY".to_string()))?;

        let backend = match std::env::var("ASL_RELAY_LLM_BACKEND")
            .unwrap_or_else(|_| "anthropic".to_string())
            .to_lowercase()
            .as_str()
        {
            "anthropic" => LlmBackend::Anthropic,
            "openai" => LlmBackend::OpenAi,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "ASL_RELAY_LLM_BACKEND".to_string(),
                    message: format!("unknown backend '{other}'"),
                });
            }
        };

        let model = std::env::var("ASL_RELAY_LLM_MODEL")
            .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string());

        let port: u16 = std::env::var("ASL_RELAY_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let moderation_url = required("ASL_RELAY_MODERATION_URL")?;
        let sentiment_url = required("ASL_RELAY_SENTIMENT_URL")?;

        Ok(Self {
            port,
            llm: LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
            },
            moderation_url,
            sentiment_url,
            publisher_url: optional("ASL_RELAY_PUBLISHER_URL"),
            topic: std::env::var("ASL_RELAY_TOPIC").unwrap_or_else(|_| "asl-actions".to_string()),
            image_url: optional("ASL_RELAY_IMAGE_URL"),
            image_moderation_url: optional("ASL_RELAY_IMAGE_MODERATION_URL"),
        })
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
