use std::env;

use serde::Deserialize;

use crate::normalize::DecodePolicy;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

fn parse_env_list(var: &str) -> Vec<String> {
    env::var(var)
        .map(|val| {
            val.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub credentials: CredentialsConfig,
    pub normalization: NormalizationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer tokens allowed to read `/api/keys`. Empty disables the endpoint.
    pub keys_tokens: Vec<String>,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

/// Model and endpoint settings for a single provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub model: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub gemini: ProviderConfig,
    /// Transport timeout for provider calls. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub enum CredentialSource {
    Env,
    Remote { url: String, token: Option<String> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub source: CredentialSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizationConfig {
    #[serde(skip, default)]
    pub policy: DecodePolicy,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig {
                model: "gpt-4o-mini".to_string(),
                base_url: OPENAI_BASE_URL.to_string(),
                max_tokens: None,
            },
            anthropic: ProviderConfig {
                model: "claude-3-5-sonnet-latest".to_string(),
                base_url: ANTHROPIC_BASE_URL.to_string(),
                max_tokens: Some(4096),
            },
            gemini: ProviderConfig {
                model: "gemini-1.5-flash".to_string(),
                base_url: GEMINI_BASE_URL.to_string(),
                max_tokens: None,
            },
            timeout_secs: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let defaults = ProvidersConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("PLANGATE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("PLANGATE_PORT", 8787),
                keys_tokens: parse_env_list("PLANGATE_KEYS_TOKENS"),
                cors_origins: parse_env_list("PLANGATE_CORS_ORIGINS"),
            },
            providers: ProvidersConfig {
                openai: ProviderConfig {
                    model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai.model),
                    base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai.base_url),
                    max_tokens: parse_env_opt("OPENAI_MAX_TOKENS"),
                },
                anthropic: ProviderConfig {
                    model: env::var("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic.model),
                    base_url: env::var("ANTHROPIC_BASE_URL")
                        .unwrap_or(defaults.anthropic.base_url),
                    max_tokens: Some(parse_env_or("ANTHROPIC_MAX_TOKENS", 4096)),
                },
                gemini: ProviderConfig {
                    model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
                    base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini.base_url),
                    max_tokens: parse_env_opt("GEMINI_MAX_TOKENS"),
                },
                timeout_secs: parse_env_opt("LLM_TIMEOUT"),
            },
            credentials: CredentialsConfig {
                source: credential_source_from_env(),
            },
            normalization: NormalizationConfig {
                policy: parse_env_or("NORMALIZATION_POLICY", DecodePolicy::Strict),
            },
        }
    }
}

fn credential_source_from_env() -> CredentialSource {
    let source = env::var("CREDENTIALS_SOURCE").unwrap_or_else(|_| "env".to_string());

    match source.trim().to_lowercase().as_str() {
        "remote" => match env::var("CREDENTIALS_URL") {
            Ok(url) if !url.trim().is_empty() => CredentialSource::Remote {
                url,
                token: env::var("CREDENTIALS_TOKEN").ok(),
            },
            _ => {
                tracing::warn!(
                    "CREDENTIALS_SOURCE=remote but CREDENTIALS_URL is not set. Falling back to environment credentials."
                );
                CredentialSource::Env
            }
        },
        "env" => CredentialSource::Env,
        other => {
            tracing::warn!(
                "Unknown CREDENTIALS_SOURCE '{}'. Falling back to environment credentials.",
                other
            );
            CredentialSource::Env
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
