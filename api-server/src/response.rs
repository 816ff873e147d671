use actix_web::{http::StatusCode, HttpResponse};
use quiver_core::VolleyError;

use crate::sessions::RegistryError;

pub(crate) fn json_error_with_code(
    status: StatusCode,
    message: impl Into<String>,
    error_code: Option<&str>,
) -> HttpResponse {
    let mut body = serde_json::json!({
        "success": false,
        "error": message.into(),
    });
    if let Some(code) = error_code {
        body["error_code"] = serde_json::Value::String(code.to_string());
    }
    HttpResponse::build(status).json(body)
}

pub(crate) fn volley_error(err: VolleyError) -> HttpResponse {
    let status = match err {
        VolleyError::CapacityExceeded { .. } => StatusCode::CONFLICT,
        VolleyError::EmptyVolley | VolleyError::InvalidCapacity => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    json_error_with_code(status, err.to_string(), Some(err.code()))
}

pub(crate) fn session_not_found() -> HttpResponse {
    json_error_with_code(
        StatusCode::NOT_FOUND,
        "unknown or expired session",
        Some("session_not_found"),
    )
}

pub(crate) fn registry_error(err: RegistryError) -> HttpResponse {
    match err {
        RegistryError::Full { .. } => json_error_with_code(
            StatusCode::SERVICE_UNAVAILABLE,
            err.to_string(),
            Some("too_many_sessions"),
        ),
        RegistryError::NotFound => session_not_found(),
        RegistryError::CommitInProgress => json_error_with_code(
            StatusCode::CONFLICT,
            err.to_string(),
            Some("commit_in_progress"),
        ),
        RegistryError::Volley(e) => volley_error(e),
    }
}
