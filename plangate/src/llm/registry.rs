//! Adapter registry: one adapter per provider, all sharing one HTTP client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProvidersConfig;
use crate::error::{PlangateError, Result};

use super::anthropic::AnthropicAdapter;
use super::gemini::GeminiAdapter;
use super::openai::OpenAiAdapter;
use super::provider::{Provider, ProviderAdapter};

#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the OpenAI, Anthropic and Gemini adapters from configuration.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let http = builder.build().map_err(|e| {
            PlangateError::Internal(format!("Failed to create LLM HTTP client: {e}"))
        })?;

        let mut registry = Self::new();
        registry.register(Arc::new(OpenAiAdapter::new(http.clone(), &config.openai)));
        registry.register(Arc::new(AnthropicAdapter::new(
            http.clone(),
            &config.anthropic,
        )));
        registry.register(Arc::new(GeminiAdapter::new(http, &config.gemini)));

        Ok(registry)
    }

    /// Add an adapter, replacing any previous one for the same provider.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let provider = adapter.provider();
        tracing::debug!(provider = %provider, model = adapter.model(), "Registered adapter");
        self.adapters.insert(provider, adapter);
    }

    pub fn get(&self, provider: Provider) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider)
    }

    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }
}
