use axum::http::StatusCode;

use super::ApiSuccess;

/// `GET /health`
pub async fn health() -> ApiSuccess<&'static str> {
    ApiSuccess::new(StatusCode::OK, "ok")
}
