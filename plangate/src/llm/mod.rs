mod anthropic;
mod gemini;
mod openai;
pub mod prompts;
mod provider;
mod registry;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use provider::{
    error_message_from_body, AdapterError, ChatMessage, MessageShape, PromptPayload, Provider,
    ProviderAdapter, Role,
};
pub use registry::AdapterRegistry;
