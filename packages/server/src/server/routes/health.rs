use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    provider: String,
    model: String,
}

/// Health check endpoint
///
/// The pipeline holds no connections, so being able to answer is the check.
pub async fn health_handler(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        provider: state.provider.clone(),
        model: state.model.clone(),
    })
}
