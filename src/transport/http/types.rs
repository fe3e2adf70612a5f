use crate::app::RacingService;
use crate::domain::error::DomainError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RacingService>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, data: Option<JsonValue>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct MoveHorseRequest {
    pub new_stable_id: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RejectRequest {
    /// Optional note stored with the decision.
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct OwnerSearchQuery {
    #[serde(default)]
    pub lname: String,
}

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Forbidden { .. } => StatusCode::FORBIDDEN,
        DomainError::AllocationConflict { .. } => StatusCode::CONFLICT,
        DomainError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::IntegrityViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps a domain error onto the response envelope, with `{code, retryable}` in `data`.
pub fn error_response(err: &DomainError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!(code = err.code(), error = %err, "request failed");
    }
    (
        status,
        Json(ApiResponse::failure(
            err.to_string(),
            Some(serde_json::json!({
                "code": err.code(),
                "retryable": err.is_retryable(),
            })),
        )),
    )
        .into_response()
}

/// Serializes `value` into a success envelope with the given status.
pub fn data_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_value(value) {
        Ok(data) => (status, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failure(
                format!("Failed to serialize response: {}", e),
                None,
            )),
        )
            .into_response(),
    }
}

pub fn domain_response<T: Serialize>(
    status: StatusCode,
    result: Result<T, DomainError>,
) -> Response {
    match result {
        Ok(value) => data_response(status, &value),
        Err(err) => error_response(&err),
    }
}
