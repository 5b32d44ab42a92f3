use axum::extract::State;
use axum::Json;

use crate::api::dto::{ErrorBody, GenerateRequest, GenerateResponse};
use crate::api::extractors::AppJson;
use crate::api::state::AppState;
use crate::error::Result;

/// Send a prompt to the chosen provider and return the normalized result.
///
/// `type` selects the system instruction and the expected shape of
/// `result`: an ordered step list for `plan`, a file tree for `structure`,
/// raw text for `code`.
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Normalized provider output", body = GenerateResponse),
        (status = 400, description = "Missing or blank field", body = ErrorBody),
        (status = 405, description = "Method not allowed", body = ErrorBody),
        (status = 500, description = "Dispatch, provider or normalization failure", body = ErrorBody),
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    AppJson(req): AppJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    let params = req.validate()?;

    tracing::info!(
        provider = %params.model,
        task = %params.task_type,
        prompt_len = params.prompt.len(),
        "Generate request"
    );

    let result = state
        .dispatcher
        .dispatch_named(&params.prompt, &params.model, &params.task_type)
        .await?;

    Ok(Json(GenerateResponse { result }))
}
