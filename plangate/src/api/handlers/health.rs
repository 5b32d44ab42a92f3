use axum::extract::State;
use axum::Json;

use crate::api::dto::{HealthResponse, ProviderStatus};
use crate::api::state::AppState;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (credentials, available) = match state.dispatcher.available_providers().await {
        Ok(available) => ("ok".to_string(), available),
        Err(e) => (format!("error: {e}"), Vec::new()),
    };

    let registry = state.dispatcher.registry();
    let providers = state
        .dispatcher
        .configured_providers()
        .into_iter()
        .map(|provider| ProviderStatus {
            provider,
            model: registry
                .get(provider)
                .map(|adapter| adapter.model().to_string())
                .unwrap_or_default(),
            available: available.contains(&provider),
        })
        .collect::<Vec<_>>();

    let status = if providers.iter().any(|p| p.available) {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        credentials,
        providers,
    })
}
