//! Error types for asl-relay.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text-generation provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors from the non-LLM collaborators (moderation, sentiment, publishing, images).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Service {service} request failed: {reason}")]
    RequestFailed { service: String, reason: String },

    #[error("Service {service} returned status {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse { service: String, reason: String },
}

impl ServiceError {
    pub(crate) fn request(service: &str, err: impl std::fmt::Display) -> Self {
        Self::RequestFailed {
            service: service.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn invalid(service: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidResponse {
            service: service.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Pipeline-related errors.
///
/// Recognized refusals and uncertain model answers are never errors; they
/// become marker text inside the outcome. Only collaborator faults land here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Moderation failed: {0}")]
    Moderation(ServiceError),

    #[error("Sentiment detection failed: {0}")]
    Sentiment(ServiceError),

    #[error("Publish failed: {0}")]
    Publish(ServiceError),
}
