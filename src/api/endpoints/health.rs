//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{success, ApiContext, Success};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub app: &'static str,
    pub version: &'static str,
    pub sessions: usize,
}

/// `GET /api/health`: liveness check, no session required.
pub async fn check(
    State(ctx): State<ApiContext>,
) -> Result<Json<Success<HealthResponse>>, ApiError> {
    Ok(success(HealthResponse {
        status: "ok",
        app: crate::config::APP_NAME,
        version: crate::config::APP_VERSION,
        sessions: ctx.core.session_count(),
    }))
}
