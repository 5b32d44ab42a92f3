//! Bearer token guard for `/api/keys`.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::PlangateError;

use super::state::AppState;

/// Rejects requests to the key endpoint unless they carry a configured token.
///
/// - No `PLANGATE_KEYS_TOKENS` configured: 404, the endpoint does not exist.
/// - Missing or non-Bearer `Authorization` header: 401.
/// - Token not in the configured list: 401.
pub async fn keys_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let tokens = &state.config.server.keys_tokens;
    if tokens.is_empty() {
        return PlangateError::NotFound("Not found".to_string()).into_response();
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                return PlangateError::Unauthorized(
                    "Invalid authorization header format. Expected: Bearer <token>".to_string(),
                )
                .into_response();
            }
        },
        None => {
            return PlangateError::Unauthorized("Missing authorization header".to_string())
                .into_response();
        }
    };

    if tokens.iter().any(|t| t == token) {
        next.run(request).await
    } else {
        tracing::warn!("Rejected key request with unknown token");
        PlangateError::Unauthorized("Invalid token".to_string()).into_response()
    }
}
