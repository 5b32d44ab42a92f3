use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::PlangateError;

use super::handlers::{self, method_not_allowed};
use super::middleware::keys_auth_middleware;
use super::openapi;
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    let origins = &state.config.server.cors_origins;

    let generate = Router::new()
        .route(
            "/generate",
            post(handlers::generate::generate).fallback(method_not_allowed),
        )
        .layer(cors_layer(origins, [Method::POST, Method::OPTIONS]));

    let keys = Router::new()
        .route("/keys", get(handlers::keys::keys).fallback(method_not_allowed))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            keys_auth_middleware,
        ))
        .layer(cors_layer(origins, [Method::GET, Method::OPTIONS]));

    let meta = Router::new()
        .route(
            "/health",
            get(handlers::health::health_check).fallback(method_not_allowed),
        )
        .route("/openapi.json", get(openapi::openapi_json))
        .layer(cors_layer(origins, [Method::GET, Method::OPTIONS]));

    let api = Router::new().merge(generate).merge(keys).merge(meta);

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for one route group. The layer answers preflight `OPTIONS` itself.
fn cors_layer<const N: usize>(origins: &[String], methods: [Method; N]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods.to_vec())
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn not_found() -> PlangateError {
    PlangateError::NotFound("Not found".to_string())
}
