use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::credentials::Secret;

/// A selectable LLM backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(format!("Unsupported model provider: {other}")),
        }
    }
}

/// How a backend wants the system instruction and user prompt delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageShape {
    /// One string: the instruction followed by the prompt.
    Concatenated,
    /// A system message followed by a user message.
    RoleMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// The request handed to an adapter, already shaped for its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPayload {
    Single(String),
    Messages(Vec<ChatMessage>),
}

impl PromptPayload {
    pub fn build(shape: MessageShape, system: &str, user: &str) -> Self {
        match shape {
            MessageShape::Concatenated => PromptPayload::Single(format!("{system}\n\n{user}")),
            MessageShape::RoleMessages => PromptPayload::Messages(vec![
                ChatMessage {
                    role: Role::System,
                    content: system.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user.to_string(),
                },
            ]),
        }
    }

    /// The system instruction, if the payload carries one separately.
    pub fn system(&self) -> Option<&str> {
        match self {
            PromptPayload::Single(_) => None,
            PromptPayload::Messages(messages) => messages
                .iter()
                .find(|m| m.role == Role::System)
                .map(|m| m.content.as_str()),
        }
    }

    /// Everything that is not the system instruction, joined.
    pub fn user_text(&self) -> String {
        match self {
            PromptPayload::Single(text) => text.clone(),
            PromptPayload::Messages(messages) => messages
                .iter()
                .filter(|m| m.role == Role::User)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// The whole payload as a single string.
    pub fn flatten(&self) -> String {
        match self {
            PromptPayload::Single(text) => text.clone(),
            PromptPayload::Messages(messages) => messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response structure: {0}")]
    InvalidResponse(String),
}

impl AdapterError {
    /// Classify a non-success HTTP response using the vendor's error body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message_from_body(body);
        if status == 401 || status == 403 {
            AdapterError::Authentication(message)
        } else {
            AdapterError::Status { status, message }
        }
    }
}

/// Pull the human-readable message out of a vendor error body.
///
/// All three vendors nest it under `error.message`; anything else falls back
/// to the (truncated) raw body.
pub fn error_message_from_body(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .or_else(|| value.get("error").and_then(Value::as_str))
    });

    match message {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.chars().take(500).collect(),
    }
}

/// Backend-specific translation between a prompt payload and raw response text.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    fn message_shape(&self) -> MessageShape;

    fn model(&self) -> &str;

    async fn invoke(
        &self,
        payload: &PromptPayload,
        credential: &Secret,
    ) -> Result<String, AdapterError>;
}

/// Reject absent or blank text so an empty completion never masquerades as a result.
pub(crate) fn require_text(text: Option<&str>, path: &str) -> Result<String, AdapterError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        Some(_) => Err(AdapterError::InvalidResponse(format!(
            "field `{path}` is empty"
        ))),
        None => Err(AdapterError::InvalidResponse(format!(
            "missing field `{path}`"
        ))),
    }
}
