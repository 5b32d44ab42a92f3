use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::Provider;
use crate::normalize::TaskType;

#[derive(Error, Debug)]
pub enum PlangateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Provider error ({provider}, {task}): {message}")]
    Provider {
        provider: Provider,
        task: TaskType,
        message: String,
    },

    #[error("Normalization error ({provider}, {task}): {message}")]
    Normalization {
        provider: Provider,
        task: TaskType,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl PlangateError {
    /// Short machine-readable name of the error kind, used in audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            PlangateError::Config(_) => "config",
            PlangateError::Dispatch(_) => "dispatch",
            PlangateError::Provider { .. } => "provider",
            PlangateError::Normalization { .. } => "normalization",
            PlangateError::Validation(_) => "validation",
            PlangateError::MethodNotAllowed(_) => "method_not_allowed",
            PlangateError::NotFound(_) => "not_found",
            PlangateError::Unauthorized(_) => "unauthorized",
            PlangateError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PlangateError::Validation(_) => StatusCode::BAD_REQUEST,
            PlangateError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            PlangateError::NotFound(_) => StatusCode::NOT_FOUND,
            PlangateError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PlangateError::Config(_)
            | PlangateError::Dispatch(_)
            | PlangateError::Provider { .. }
            | PlangateError::Normalization { .. }
            | PlangateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PlangateError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            PlangateError::Validation(msg)
            | PlangateError::MethodNotAllowed(msg)
            | PlangateError::NotFound(msg)
            | PlangateError::Unauthorized(msg) => msg.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %message, "Request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PlangateError>;
