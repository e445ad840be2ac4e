use crate::model::HealthResponse;
use axum::Json;

/// Liveness only; backends are not probed.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::OK)
}
