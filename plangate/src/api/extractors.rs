use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::PlangateError;

/// `axum::Json` with rejections reported as 400 `{ "error": ... }` bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(PlangateError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for PlangateError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> PlangateError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            PlangateError::Validation(format!("Invalid request body: {}", err.body_text()))
        }
        JsonRejection::JsonSyntaxError(err) => {
            PlangateError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => PlangateError::Validation(
            "Missing `Content-Type: application/json` header".to_string(),
        ),
        JsonRejection::BytesRejection(_) => {
            PlangateError::Internal("Failed to read request body".to_string())
        }
        _ => PlangateError::Validation(rejection.body_text()),
    }
}
