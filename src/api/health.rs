//! Health endpoint for monitoring.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::resilience::CircuitState;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub circuit_breaker_state: &'static str,
    pub breaker_failures: u32,
    pub cached_series_entries: usize,
    pub fallback_configured: bool,
    pub uptime_seconds: u64,
    pub timestamp: i64,
}

/// Overall status follows the breaker: closed is healthy, half-open is
/// degraded, open is critical.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let breaker = state.bcra.breaker_state();
    let status = match breaker {
        CircuitState::Closed => "healthy",
        CircuitState::HalfOpen => "degraded",
        CircuitState::Open => "critical",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        circuit_breaker_state: breaker.as_str(),
        breaker_failures: state.bcra.breaker_failures(),
        cached_series_entries: state.bcra.cached_entries(),
        fallback_configured: state.bcra.has_fallback(),
        uptime_seconds: state.started.elapsed().as_secs(),
        timestamp: Utc::now().timestamp(),
    })
}
