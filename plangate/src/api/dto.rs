//! Request/response DTOs for the proxy endpoints.

use serde::{Deserialize, Serialize};

use crate::error::{PlangateError, Result};
use crate::llm::Provider;
use crate::normalize::NormalizedResult;

/// Request body for `POST /api/generate`.
///
/// Every field is optional at the serde level so that missing fields can be
/// reported together with a 400 instead of a generic JSON rejection.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct GenerateRequest {
    /// The user's natural-language prompt.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Provider identifier: `openai`, `anthropic` or `gemini`.
    #[serde(default)]
    pub model: Option<String>,
    /// Task identifier: `plan`, `structure` or `code`.
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
}

/// A validated [`GenerateRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateParams {
    pub prompt: String,
    pub model: String,
    pub task_type: String,
}

impl GenerateRequest {
    pub fn validate(self) -> Result<GenerateParams> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let prompt = present(self.prompt);
        let model = present(self.model);
        let task_type = present(self.task_type);

        let missing: Vec<&str> = [
            ("prompt", prompt.is_none()),
            ("model", model.is_none()),
            ("type", task_type.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (prompt, model, task_type) {
            (Some(prompt), Some(model), Some(task_type)) => Ok(GenerateParams {
                prompt,
                model,
                task_type,
            }),
            _ => Err(PlangateError::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Success body for `POST /api/generate`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct GenerateResponse {
    /// Plan steps, file tree nodes, or code text depending on the task type.
    pub result: NormalizedResult,
}

/// Error body returned by every endpoint on failure.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProviderStatus {
    pub provider: Provider,
    pub model: String,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub credentials: String,
    pub providers: Vec<ProviderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_complete_request() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"prompt":"todo app","model":"openai","type":"plan"}"#)
                .unwrap();

        let params = request.validate().unwrap();
        assert_eq!(params.prompt, "todo app");
        assert_eq!(params.model, "openai");
        assert_eq!(params.task_type, "plan");
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let request: GenerateRequest = serde_json::from_str(r#"{"prompt":"  "}"#).unwrap();

        match request.validate() {
            Err(PlangateError::Validation(message)) => {
                assert_eq!(message, "Missing required field(s): prompt, model, type")
            }
            other => panic!("Expected validation error, got: {other:?}"),
        }
    }
}
