use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::credentials::Secret;
use crate::llm::provider::{
    require_text, AdapterError, MessageShape, PromptPayload, Provider, ProviderAdapter,
};

const TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";

/// Gemini `generateContent`. Takes the instruction and prompt as one text part.
#[derive(Clone)]
pub struct GeminiAdapter {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
}

impl GeminiAdapter {
    pub fn new(http: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_body(&self, payload: &PromptPayload) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": payload.flatten() }]
            }]
        });

        if let Some(max_tokens) = self.max_tokens {
            body["generationConfig"] = json!({ "maxOutputTokens": max_tokens });
        }

        body
    }

    fn extract_text(body: &Value) -> Result<String, AdapterError> {
        if body.get("candidates").is_none() {
            // Blocked prompts come back as 200 with only promptFeedback.
            let reason = body
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str);
            return Err(AdapterError::InvalidResponse(match reason {
                Some(reason) => format!("no candidates returned (blocked: {reason})"),
                None => "missing field `candidates`".to_string(),
            }));
        }

        require_text(
            body.pointer(TEXT_POINTER).and_then(Value::as_str),
            "candidates[0].content.parts[0].text",
        )
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn message_shape(&self) -> MessageShape {
        MessageShape::Concatenated
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(
        &self,
        payload: &PromptPayload,
        credential: &Secret,
    ) -> Result<String, AdapterError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", credential.expose())
            .json(&self.build_body(payload))
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
