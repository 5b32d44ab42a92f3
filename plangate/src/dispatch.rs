//! Provider dispatch
//!
//! The [`Dispatcher`] is the only place where a provider, a task type and a
//! prompt meet. It looks up the adapter, resolves the credential through the
//! shared [`CredentialCache`], shapes the prompt for the adapter, and runs the
//! raw reply through the [`Normalizer`]. It never inspects which provider it
//! is talking to beyond the registry lookup.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::audit::{AuditOutcome, AuditRecord, AuditSink};
use crate::credentials::CredentialCache;
use crate::error::{PlangateError, Result};
use crate::llm::prompts::system_instruction;
use crate::llm::{AdapterRegistry, PromptPayload, Provider};
use crate::normalize::{NormalizedResult, Normalizer, TaskType};

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<AdapterRegistry>,
    credentials: Arc<CredentialCache>,
    normalizer: Normalizer,
    audit: Option<Arc<dyn AuditSink>>,
}

impl Dispatcher {
    pub fn new(
        registry: AdapterRegistry,
        credentials: Arc<CredentialCache>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            credentials,
            normalizer,
            audit: None,
        }
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Run the full pipeline: adapter call followed by normalization.
    pub async fn dispatch(
        &self,
        prompt: &str,
        provider: Provider,
        task: TaskType,
    ) -> Result<NormalizedResult> {
        let started = Instant::now();
        let result = match self.invoke(prompt, provider, task).await {
            Ok(raw) => self.normalizer.normalize(&raw, task).map_err(|e| {
                PlangateError::Normalization {
                    provider,
                    task,
                    message: e.message,
                }
            }),
            Err(e) => Err(e),
        };
        self.audit(provider, task, started, &result);
        result
    }

    /// Like [`Dispatcher::dispatch`] but returns the provider's raw text.
    pub async fn dispatch_raw(
        &self,
        prompt: &str,
        provider: Provider,
        task: TaskType,
    ) -> Result<String> {
        let started = Instant::now();
        let result = self.invoke(prompt, provider, task).await;
        self.audit(provider, task, started, &result);
        result
    }

    /// Dispatch using wire identifiers, e.g. `("openai", "plan")`.
    pub async fn dispatch_named(
        &self,
        prompt: &str,
        provider: &str,
        task: &str,
    ) -> Result<NormalizedResult> {
        let rejected = |e: String| {
            tracing::warn!(provider = %provider, task = %task, error = %e, "Rejected dispatch");
            PlangateError::Dispatch(format!("{e} (provider: {provider}, task: {task})"))
        };

        let parsed_provider: Provider = provider.parse().map_err(rejected)?;
        let parsed_task: TaskType = task.parse().map_err(rejected)?;

        self.dispatch(prompt, parsed_provider, parsed_task).await
    }

    /// Providers that have both an adapter and a credential.
    pub async fn available_providers(&self) -> Result<Vec<Provider>> {
        let credentials = self.credentials.get().await?;
        Ok(self
            .registry
            .providers()
            .into_iter()
            .filter(|p| credentials.contains(*p))
            .collect())
    }

    pub fn configured_providers(&self) -> Vec<Provider> {
        self.registry.providers()
    }

    async fn invoke(&self, prompt: &str, provider: Provider, task: TaskType) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(PlangateError::Validation(
                "Prompt cannot be empty".to_string(),
            ));
        }

        let adapter = self.registry.get(provider).ok_or_else(|| {
            tracing::warn!(provider = %provider, task = %task, "No adapter registered");
            PlangateError::Dispatch(format!("Unsupported provider: {provider} (task: {task})"))
        })?;

        let credentials = self.credentials.get().await.map_err(|e| {
            let message = match e {
                PlangateError::Config(message) => message,
                other => other.to_string(),
            };
            tracing::error!(provider = %provider, task = %task, error = %message, "Credentials unavailable");
            PlangateError::Config(format!(
                "Credentials unavailable for provider {provider} (task: {task}): {message}"
            ))
        })?;
        let credential = credentials.get(provider).ok_or_else(|| {
            tracing::warn!(provider = %provider, task = %task, "Provider has no credential");
            PlangateError::Dispatch(format!(
                "Provider {provider} is unavailable: no API key configured (task: {task})"
            ))
        })?;

        let payload = PromptPayload::build(adapter.message_shape(), system_instruction(task), prompt);

        tracing::debug!(provider = %provider, task = %task, model = adapter.model(), prompt_len = prompt.len(), "Dispatching prompt");

        adapter.invoke(&payload, credential).await.map_err(|e| {
            tracing::error!(provider = %provider, task = %task, error = %e, "Provider call failed");
            PlangateError::Provider {
                provider,
                task,
                message: e.to_string(),
            }
        })
    }

    fn audit<T>(&self, provider: Provider, task: TaskType, started: Instant, result: &Result<T>) {
        let Some(sink) = &self.audit else {
            return;
        };

        let outcome = match result {
            Ok(_) => AuditOutcome::Success,
            Err(e) => AuditOutcome::Failure { kind: e.kind() },
        };

        sink.record(&AuditRecord {
            request_id: Uuid::new_v4(),
            provider,
            task,
            outcome,
            latency_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });
    }
}
