use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::routes::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
    pub version: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: state.service.name.clone(),
        version: state.service.version.clone(),
    })
}
