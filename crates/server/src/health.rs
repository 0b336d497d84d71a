use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use booksum_core::interpret::InterpreterMode;
use chrono::Utc;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct HealthState {
    interpreter_mode: InterpreterMode,
    fx_configured: bool,
}

impl HealthState {
    pub fn new(interpreter_mode: InterpreterMode, fx_configured: bool) -> Self {
        Self { interpreter_mode, fx_configured }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub interpreter_mode: &'static str,
    pub fx: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Missing FX configuration degrades only cross-currency queries, so the
/// service still reports ready.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let fx = if state.fx_configured {
        HealthCheck { status: "ready", detail: "FX conversion configured".to_string() }
    } else {
        HealthCheck {
            status: "disabled",
            detail: "FX provider not configured; only same-currency totals are available"
                .to_string(),
        }
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "booksum-server runtime initialized".to_string(),
        },
        interpreter_mode: state.interpreter_mode.as_str(),
        fx,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
