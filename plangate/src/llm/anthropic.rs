//! Anthropic messages API adapter.
//!
//! The system instruction travels in the top-level `system` field; the user
//! prompt is the only entry in `messages`.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::credentials::Secret;
use crate::llm::provider::{
    require_text, AdapterError, MessageShape, PromptPayload, Provider, ProviderAdapter,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Clone)]
pub struct AnthropicAdapter {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

impl AnthropicAdapter {
    pub fn new(http: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }

    fn build_request<'a>(&'a self, payload: &'a PromptPayload) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: payload.system(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: payload.user_text(),
            }],
        }
    }

    fn extract_text(body: &Value) -> Result<String, AdapterError> {
        let blocks = body
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| AdapterError::InvalidResponse("missing field `content`".to_string()))?;

        let text = blocks
            .iter()
            .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str);

        require_text(text, "content[].text")
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn message_shape(&self) -> MessageShape {
        MessageShape::RoleMessages
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(
        &self,
        payload: &PromptPayload,
        credential: &Secret,
    ) -> Result<String, AdapterError> {
        let request = self.build_request(payload);

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(AdapterError::from_status(status.as_u16(), &body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| AdapterError::InvalidResponse(format!("body is not JSON: {e}")))?;

        Self::extract_text(&value)
    }
}
