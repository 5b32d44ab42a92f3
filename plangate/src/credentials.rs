//! Provider credentials
//!
//! Credentials come from a [`CredentialGate`]: the process environment, a
//! remote key-fetch endpoint, or values injected directly. The
//! [`CredentialCache`] sits in front of the gate and guarantees the gate is
//! consulted at most once per cache, no matter how many dispatches race to
//! initialize it.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{PlangateError, Result};
use crate::llm::Provider;

/// An opaque API key. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Returns `None` for blank values so they count as absent.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Provider → secret mapping. May be partially populated.
#[derive(Clone, Default)]
pub struct Credentials {
    secrets: HashMap<Provider, Secret>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: Provider, value: impl Into<String>) -> Self {
        self.insert(provider, value);
        self
    }

    pub fn insert(&mut self, provider: Provider, value: impl Into<String>) {
        if let Some(secret) = Secret::new(value) {
            self.secrets.insert(provider, secret);
        }
    }

    pub fn get(&self, provider: Provider) -> Option<&Secret> {
        self.secrets.get(&provider)
    }

    pub fn contains(&self, provider: Provider) -> bool {
        self.secrets.contains_key(&provider)
    }

    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.contains(*p))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn to_payload(&self) -> KeysPayload {
        let expose = |p: Provider| self.get(p).map(|s| s.expose().to_string());
        KeysPayload {
            openai: expose(Provider::OpenAi),
            anthropic: expose(Provider::Anthropic),
            gemini: expose(Provider::Gemini),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("providers", &self.providers())
            .finish()
    }
}

/// Wire format of the key-fetch endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct KeysPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<String>,
}

impl From<KeysPayload> for Credentials {
    fn from(payload: KeysPayload) -> Self {
        let mut credentials = Credentials::new();
        for (provider, value) in [
            (Provider::OpenAi, payload.openai),
            (Provider::Anthropic, payload.anthropic),
            (Provider::Gemini, payload.gemini),
        ] {
            if let Some(value) = value {
                credentials.insert(provider, value);
            }
        }
        credentials
    }
}

/// Source of provider credentials.
#[async_trait]
pub trait CredentialGate: Send + Sync {
    async fn get_credentials(&self) -> Result<Credentials>;
}

/// Reads `OPENAI_API_KEY`, `ANTHROPIC_API_KEY` and `GEMINI_API_KEY`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialGate;

#[async_trait]
impl CredentialGate for EnvCredentialGate {
    async fn get_credentials(&self) -> Result<Credentials> {
        let mut credentials = Credentials::new();
        for provider in Provider::ALL {
            if let Ok(value) = std::env::var(provider.api_key_var()) {
                credentials.insert(provider, value);
            }
        }

        if credentials.is_empty() {
            tracing::warn!("No provider API keys found in the environment");
        }

        Ok(credentials)
    }
}

/// Credentials handed in by the embedding application.
#[derive(Debug, Clone)]
pub struct StaticCredentialGate {
    credentials: Credentials,
}

impl StaticCredentialGate {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialGate for StaticCredentialGate {
    async fn get_credentials(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}

/// Fetches credentials from another instance's `GET /api/keys`.
#[derive(Clone)]
pub struct RemoteCredentialGate {
    client: reqwest::Client,
    url: String,
    token: Option<Secret>,
}

impl RemoteCredentialGate {
    pub fn new(client: reqwest::Client, url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            token: token.and_then(Secret::new),
        }
    }
}

#[async_trait]
impl CredentialGate for RemoteCredentialGate {
    async fn get_credentials(&self) -> Result<Credentials> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose());
        }

        let response = request.send().await.map_err(|e| {
            PlangateError::Config(format!("Key service unreachable: {}", e.without_url()))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlangateError::Config(format!(
                "Key service returned HTTP {}",
                status.as_u16()
            )));
        }

        let payload: KeysPayload = response.json().await.map_err(|e| {
            PlangateError::Config(format!("Key service returned malformed keys: {}", e.without_url()))
        })?;

        Ok(payload.into())
    }
}

type SharedFetch = Shared<BoxFuture<'static, std::result::Result<Arc<Credentials>, String>>>;

/// Once-only, single-flight front for a [`CredentialGate`].
///
/// The first caller creates the fetch; everyone arriving before it resolves
/// awaits the same shared future and sees the same outcome. A successful
/// result is also stored in `ready` so later calls skip the lock entirely.
/// A failed fetch stays failed: the gate is never consulted a second time.
pub struct CredentialCache {
    gate: Arc<dyn CredentialGate>,
    ready: OnceLock<Arc<Credentials>>,
    in_flight: Mutex<Option<SharedFetch>>,
    fetches: AtomicUsize,
}

impl CredentialCache {
    pub fn new(gate: Arc<dyn CredentialGate>) -> Self {
        Self {
            gate,
            ready: OnceLock::new(),
            in_flight: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A cache that is already populated and never consults a gate.
    pub fn preloaded(credentials: Credentials) -> Self {
        let cache = Self::new(Arc::new(StaticCredentialGate::new(credentials.clone())));
        let _ = cache.ready.set(Arc::new(credentials));
        cache
    }

    pub async fn get(&self) -> Result<Arc<Credentials>> {
        if let Some(credentials) = self.ready.get() {
            return Ok(Arc::clone(credentials));
        }

        let fetch = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            in_flight
                .get_or_insert_with(|| {
                    self.fetches.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!("Fetching provider credentials");
                    let gate = Arc::clone(&self.gate);
                    async move {
                        gate.get_credentials()
                            .await
                            .map(Arc::new)
                            .map_err(|e| match e {
                                PlangateError::Config(message) => message,
                                other => other.to_string(),
                            })
                    }
                    .boxed()
                    .shared()
                })
                .clone()
        };

        match fetch.await {
            Ok(credentials) => {
                let _ = self.ready.set(Arc::clone(&credentials));
                Ok(credentials)
            }
            Err(message) => {
                tracing::error!(error = %message, "Credential fetch failed");
                Err(PlangateError::Config(message))
            }
        }
    }

    /// Number of times the underlying gate has been consulted.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }
}
