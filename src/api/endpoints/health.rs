//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub instance_id: String,
    pub model: String,
    pub uptime_secs: i64,
}

/// `GET /api/health`, unauthenticated liveness check.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        instance_id: ctx.core.instance_id.to_string(),
        model: ctx.core.advisory().model().to_string(),
        uptime_secs: (Utc::now() - ctx.core.started_at).num_seconds(),
    })
}
