use std::sync::Arc;

use crate::audit::TracingAuditSink;
use crate::config::{Config, CredentialSource};
use crate::credentials::{CredentialCache, CredentialGate, EnvCredentialGate, RemoteCredentialGate};
use crate::dispatch::Dispatcher;
use crate::error::{PlangateError, Result};
use crate::llm::AdapterRegistry;
use crate::normalize::Normalizer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
    /// Shared with the dispatcher so `/api/keys` sees the same single fetch.
    pub credentials: Arc<CredentialCache>,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Dispatcher, credentials: Arc<CredentialCache>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
            credentials,
        }
    }

    /// Wire up adapters, the credential gate and the dispatcher from `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let registry = AdapterRegistry::from_config(&config.providers)?;

        let gate: Arc<dyn CredentialGate> = match &config.credentials.source {
            CredentialSource::Env => Arc::new(EnvCredentialGate),
            CredentialSource::Remote { url, token } => {
                let client = reqwest::Client::builder().build().map_err(|e| {
                    PlangateError::Internal(format!("Failed to create key service client: {e}"))
                })?;
                Arc::new(RemoteCredentialGate::new(client, url.clone(), token.clone()))
            }
        };
        let credentials = Arc::new(CredentialCache::new(gate));

        let dispatcher = Dispatcher::new(
            registry,
            Arc::clone(&credentials),
            Normalizer::new(config.normalization.policy),
        )
        .with_audit(Arc::new(TracingAuditSink));

        Ok(Self::new(config, dispatcher, credentials))
    }
}
