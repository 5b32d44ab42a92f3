use axum::Json;
use utoipa::OpenApi;

use super::dto;
use super::handlers;
use crate::credentials::KeysPayload;
use crate::llm::Provider;
use crate::normalize::{FileKind, FileNode, NormalizedResult, PlanStep, TaskType};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plangate API",
        version = "1.0.0",
        description = "Prompt gateway that dispatches to OpenAI, Anthropic or Gemini and returns normalized plans, file trees or code.",
    ),
    paths(
        handlers::generate::generate,
        handlers::keys::keys,
        handlers::health::health_check,
    ),
    components(schemas(
        dto::GenerateRequest,
        dto::GenerateResponse,
        dto::ErrorBody,
        dto::HealthResponse,
        dto::ProviderStatus,
        NormalizedResult,
        PlanStep,
        FileNode,
        FileKind,
        TaskType,
        Provider,
        KeysPayload,
    )),
    tags(
        (name = "generate", description = "Prompt dispatch and normalization"),
        (name = "keys", description = "Provider key distribution (auth required)"),
        (name = "health", description = "Health check"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
