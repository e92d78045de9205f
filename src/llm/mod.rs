//! Text-generation integration for asl-relay.
//!
//! Supports:
//! - **Anthropic**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! Uses the rig-core crate for HTTP transport and `RigGenerator` to bridge
//! rig's `CompletionModel` trait to the pipeline's `Generate` capability.

mod rig_adapter;

pub use rig_adapter::RigGenerator;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::config::GenerationParams;
use crate::error::LlmError;
use crate::services::Generate;

/// Marks the end of a label the model sometimes prepends ("Simplified: ...").
const LABEL_SEPARATOR: char = ':';

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

/// Configuration for creating a text generator.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Create a text generator from configuration.
///
/// Every call made through the generator uses the same sampling parameters.
pub fn create_generator(
    config: &LlmConfig,
    params: &GenerationParams,
) -> Result<Arc<dyn Generate>, LlmError> {
    let extra = sampling_params(config.backend, params);
    let key = config.api_key.expose_secret();

    match config.backend {
        LlmBackend::Anthropic => {
            use rig::providers::anthropic;

            let client: rig::client::Client<anthropic::client::AnthropicExt> =
                anthropic::Client::new(key).map_err(|e| client_error("anthropic", e))?;
            tracing::info!(model = %config.model, backend = "anthropic", "Text generator ready");
            let model = client.completion_model(&config.model);
            Ok(Arc::new(RigGenerator::new(model, &config.model, params, extra)))
        }
        LlmBackend::OpenAi => {
            use rig::providers::openai;

            let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
                openai::Client::new(key).map_err(|e| client_error("openai", e))?;
            tracing::info!(model = %config.model, backend = "openai", "Text generator ready");
            let model = client.completion_model(&config.model);
            Ok(Arc::new(RigGenerator::new(model, &config.model, params, extra)))
        }
    }
}

/// Provider-specific sampling fields sent alongside temperature and max tokens.
///
/// OpenAI has no `top_k` or stop sequences on the responses endpoint.
pub fn sampling_params(backend: LlmBackend, params: &GenerationParams) -> serde_json::Value {
    match backend {
        LlmBackend::Anthropic => serde_json::json!({
            "top_p": params.top_p,
            "top_k": params.top_k,
            "stop_sequences": params.stop_sequences,
        }),
        LlmBackend::OpenAi => serde_json::json!({ "top_p": params.top_p }),
    }
}

fn client_error(provider: &str, err: impl std::fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: format!("client construction failed: {err}"),
    }
}

/// Normalize a raw completion into plain sentence text.
///
/// Drops quote and newline artifacts, unescapes `\.` and `\,`, and discards
/// everything up to and including the first `:` (the model likes to answer
/// with "Here is the simplified sentence: ...").
pub fn clean_completion(raw: &str) -> String {
    let cleaned = raw
        .replace('"', "")
        .replace('\n', "")
        .replace("\\.", ".")
        .replace("\\,", ",");

    let body = match cleaned.find(LABEL_SEPARATOR) {
        Some(idx) => &cleaned[idx + LABEL_SEPARATOR.len_utf8()..],
        None => cleaned.as_str(),
    };

    body.trim().to_string()
}
