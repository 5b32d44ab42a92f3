use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::credentials::Secret;
use crate::llm::provider::{
    require_text, AdapterError, MessageShape, PromptPayload, Provider, ProviderAdapter, Role,
};

/// OpenAI chat completions, sent as a system + user message pair.
///
/// Requests and responses use the async-openai types; the call itself goes
/// through the shared `reqwest` client so a failed response keeps its status
/// and body text.
#[derive(Clone)]
pub struct OpenAiAdapter {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
}

impl OpenAiAdapter {
    pub fn new(http: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(
        &self,
        payload: &PromptPayload,
    ) -> Result<CreateChatCompletionRequest, AdapterError> {
        let invalid = |e: OpenAIError| AdapterError::Transport(format!("invalid request: {e}"));

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        match payload {
            PromptPayload::Single(text) => messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(text.as_str())
                    .build()
                    .map_err(invalid)?
                    .into(),
            ),
            PromptPayload::Messages(items) => {
                for item in items {
                    let message = match item.role {
                        Role::System => ChatCompletionRequestSystemMessageArgs::default()
                            .content(item.content.as_str())
                            .build()
                            .map_err(invalid)?
                            .into(),
                        Role::User => ChatCompletionRequestUserMessageArgs::default()
                            .content(item.content.as_str())
                            .build()
                            .map_err(invalid)?
                            .into(),
                    };
                    messages.push(message);
                }
            }
        }

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.model.clone()).messages(messages);
        if let Some(max_tokens) = self.max_tokens {
            request.max_tokens(max_tokens);
        }

        request.build().map_err(invalid)
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String, AdapterError> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AdapterError::InvalidResponse("missing field `choices[0]`".to_string())
        })?;

        require_text(choice.message.content.as_deref(), "choices[0].message.content")
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAi
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
        let request = self.build_request(payload)?;

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credential.expose())
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

        let completion: CreateChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        Self::extract_content(completion)
    }
}
