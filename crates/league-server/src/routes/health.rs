//! Liveness endpoint
//!
//! Besides the build version it reports whether outbound mail is switched on,
//! since with mail off every notification comes back skipped.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub mail_enabled: bool,
    pub timestamp: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "league-portal",
        version: env!("CARGO_PKG_VERSION"),
        mail_enabled: state.config.mail.enabled,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
