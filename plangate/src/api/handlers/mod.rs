pub mod generate;
pub mod health;
pub mod keys;

use axum::http::Method;

use crate::error::PlangateError;

/// Fallback for a known path hit with the wrong method.
pub async fn method_not_allowed(method: Method) -> PlangateError {
    PlangateError::MethodNotAllowed(format!("Method {method} not allowed"))
}
