use axum::extract::State;
use axum::Json;

use crate::api::dto::ErrorBody;
use crate::api::state::AppState;
use crate::credentials::KeysPayload;
use crate::error::Result;

/// Return the provider keys held by the gateway.
///
/// Disabled (404) unless `PLANGATE_KEYS_TOKENS` is set; every call must carry
/// one of those tokens as a bearer credential.
#[utoipa::path(
    get,
    path = "/api/keys",
    tag = "keys",
    responses(
        (status = 200, description = "Provider API keys", body = KeysPayload),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "Endpoint disabled", body = ErrorBody),
        (status = 500, description = "Credential fetch failed", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn keys(State(state): State<AppState>) -> Result<Json<KeysPayload>> {
    let credentials = state.credentials.get().await?;
    tracing::info!(providers = ?credentials.providers(), "Serving provider keys");
    Ok(Json(credentials.to_payload()))
}
