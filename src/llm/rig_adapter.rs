//! Bridges a rig-core `CompletionModel` to the `Generate` capability.

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use tracing::debug;

use crate::config::GenerationParams;
use crate::error::LlmError;
use crate::llm::clean_completion;
use crate::services::Generate;

/// Single-prompt text generator backed by a rig completion model.
pub struct RigGenerator<M> {
    model: M,
    model_name: String,
    temperature: f64,
    max_tokens: u64,
    additional_params: serde_json::Value,
}

impl<M: CompletionModel> RigGenerator<M> {
    pub fn new(
        model: M,
        model_name: &str,
        params: &GenerationParams,
        additional_params: serde_json::Value,
    ) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            additional_params,
        }
    }
}

#[async_trait]
impl<M: CompletionModel> Generate for RigGenerator<M> {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .model
            .completion_request(prompt)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .additional_params(self.additional_params.clone())
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.model_name.clone(),
                reason: e.to_string(),
            })?;

        let raw: String = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if raw.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "completion contained no text".to_string(),
            });
        }

        let completion = clean_completion(&raw);
        debug!(model = %self.model_name, completion = %completion, "Generation complete");
        Ok(completion)
    }
}
