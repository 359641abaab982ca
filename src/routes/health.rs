//! Health check endpoint
//!
//! `/health` is a liveness probe: it answers 200 whenever the process is
//! serving, without touching the hosted store.

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    /// Service version
    pub version: &'static str,
    /// Seconds since the server started
    pub uptime: u64,
    /// `development` (memory store, local auth) or `production`
    pub mode: &'static str,
    #[serde(rename = "contactEnabled")]
    pub contact_enabled: bool,
    /// Sessions currently tracked by the session store
    #[serde(rename = "activeSessions")]
    pub active_sessions: usize,
    pub timestamp: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        contact_enabled: state.contact.is_some(),
        active_sessions: state.sessions.len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

pub fn health_check(state: &AppState) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(state))
}
