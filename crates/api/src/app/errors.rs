use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shelfscan_core::DomainError;
use shelfscan_infra::stock_store::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Unavailable(msg) => {
            tracing::warn!(error = %msg, "stock store unavailable");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_unavailable", msg)
        }
        StoreError::Decode(msg) => {
            tracing::warn!(error = %msg, "stock store returned an undecodable row");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "decode_error", msg)
        }
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "item not found"),
        StoreError::Invalid(e) => domain_error_to_response(e),
    }
}

/// Every domain error is a caller mistake; absence is reported by the store.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "malformed_input", err.to_string())
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "malformed_input", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn json_message(status: StatusCode, message: &'static str) -> axum::response::Response {
    (status, axum::Json(json!({ "message": message }))).into_response()
}
