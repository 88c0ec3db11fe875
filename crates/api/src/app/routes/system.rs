use axum::{Json, http::StatusCode, response::IntoResponse};

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "healthy" })))
}

pub async fn ping() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "API is working!" }))
}
