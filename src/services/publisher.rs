//! Outbound envelopes for the avatar message bus.
//!
//! The avatar consumer reads `{"Action", "Data", "kwargs"}`; the action names
//! below are the ones it understands.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{Publish, post_json};
use crate::error::ServiceError;

const SERVICE: &str = "publisher";

/// Avatar actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AnimateSentence,
    ChangeAvatar,
    ChangeBackground,
    ChangeSignRate,
    StopAllAnimations,
}

impl Action {
    /// Bus message group. Messages within a group are delivered in order.
    pub fn group_id(&self) -> &'static str {
        match self {
            Self::AnimateSentence => "1",
            Self::ChangeBackground => "2",
            Self::ChangeAvatar => "3",
            Self::StopAllAnimations => "4",
            Self::ChangeSignRate => "5",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AnimateSentence => "ANIMATE_SENTENCE",
            Self::ChangeAvatar => "CHANGE_AVATAR",
            Self::ChangeBackground => "CHANGE_BACKGROUND",
            Self::ChangeSignRate => "CHANGE_SIGN_RATE",
            Self::StopAllAnimations => "STOP_ALL_ANIMATIONS",
        }
    }
}

/// One bus message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Action")]
    pub action: Action,
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<BTreeMap<String, String>>,
}

impl Envelope {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            data: None,
            kwargs: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_kwarg(mut self, key: &str, value: impl Into<String>) -> Self {
        self.kwargs
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Bus delivery options.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub deduplication_id: String,
    pub group_id: String,
}

impl PublishOptions {
    /// Options with a freshly generated deduplication id.
    ///
    /// A random id means two identical requests are both delivered. Deriving
    /// it from the request content would make publishing idempotent; that is
    /// left to the integrator.
    pub fn fresh(action: Action) -> Self {
        Self {
            deduplication_id: Uuid::new_v4().to_string(),
            group_id: action.group_id().to_string(),
        }
    }
}

/// What the bus reports back after accepting a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishRequest<'a> {
    topic: &'a str,
    /// The envelope, JSON-encoded as a string.
    message: String,
    message_deduplication_id: &'a str,
    message_group_id: &'a str,
}

/// Publishes envelopes to a topic endpoint over HTTP.
pub struct HttpPublisher {
    client: reqwest::Client,
    url: String,
    topic: String,
}

impl HttpPublisher {
    pub fn new(url: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Publish for HttpPublisher {
    async fn publish(
        &self,
        envelope: &Envelope,
        options: &PublishOptions,
    ) -> Result<PublishReceipt, ServiceError> {
        let message =
            serde_json::to_string(envelope).map_err(|e| ServiceError::invalid(SERVICE, e))?;
        let request = PublishRequest {
            topic: &self.topic,
            message,
            message_deduplication_id: &options.deduplication_id,
            message_group_id: &options.group_id,
        };

        let receipt: PublishReceipt = post_json(&self.client, SERVICE, &self.url, &request).await?;
        info!(
            topic = %self.topic,
            action = envelope.action.label(),
            message_id = %receipt.message_id,
            "Envelope published"
        );
        Ok(receipt)
    }
}

/// Logs envelopes instead of sending them. Used when no bus is configured.
pub struct LogPublisher;

#[async_trait]
impl Publish for LogPublisher {
    async fn publish(
        &self,
        envelope: &Envelope,
        options: &PublishOptions,
    ) -> Result<PublishReceipt, ServiceError> {
        let message =
            serde_json::to_string(envelope).map_err(|e| ServiceError::invalid(SERVICE, e))?;
        info!(
            action = envelope.action.label(),
            group_id = %options.group_id,
            message = %message,
            "Envelope (not published, no bus configured)"
        );
        Ok(PublishReceipt {
            message_id: options.deduplication_id.clone(),
            sequence_number: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animate_envelope_shape() {
        let envelope = Envelope::new(Action::AnimateSentence)
            .with_data("the cat sat")
            .with_kwarg("sentiment", "NEUTRAL")
            .with_kwarg("asl_text", "cat sat")
            .with_kwarg("tense", "past");

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["Action"], "ANIMATE_SENTENCE");
        assert_eq!(json["Data"], "the cat sat");
        assert_eq!(json["kwargs"]["asl_text"], "cat sat");
        assert_eq!(json["kwargs"]["tense"], "past");
    }

    #[test]
    fn stop_envelope_has_only_action() {
        let json = serde_json::to_value(Envelope::new(Action::StopAllAnimations)).unwrap();
        assert_eq!(json, serde_json::json!({"Action": "STOP_ALL_ANIMATIONS"}));
    }

    #[test]
    fn group_ids_per_action() {
        assert_eq!(Action::AnimateSentence.group_id(), "1");
        assert_eq!(Action::ChangeAvatar.group_id(), "3");
        assert_eq!(Action::StopAllAnimations.group_id(), "4");
        assert_eq!(Action::ChangeSignRate.group_id(), "5");
    }

    #[test]
    fn label_matches_serialized_name() {
        for action in [
            Action::AnimateSentence,
            Action::ChangeAvatar,
            Action::ChangeBackground,
            Action::ChangeSignRate,
            Action::StopAllAnimations,
        ] {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, action.label());
        }
    }

    #[test]
    fn fresh_options_never_repeat() {
        let a = PublishOptions::fresh(Action::AnimateSentence);
        let b = PublishOptions::fresh(Action::AnimateSentence);
        assert_ne!(a.deduplication_id, b.deduplication_id);
        assert_eq!(a.group_id, "1");
    }

    #[tokio::test]
    async fn log_publisher_echoes_dedup_id() {
        let options = PublishOptions::fresh(Action::ChangeAvatar);
        let receipt = LogPublisher
            .publish(&Envelope::new(Action::ChangeAvatar).with_data("Ana"), &options)
            .await
            .unwrap();
        assert_eq!(receipt.message_id, options.deduplication_id);
        assert!(receipt.sequence_number.is_none());
    }
}
