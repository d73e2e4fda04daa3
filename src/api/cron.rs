//! Secret-guarded endpoint for the scheduled warm job.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::warm::{warm_caches, WarmSummary};

use super::error::ApiError;
use super::AppState;

fn refuse(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Run a warm pass on behalf of the scheduler.
///
/// Callers must present `Authorization: Bearer <CRON_SECRET>`. When no
/// secret is configured the endpoint answers 503 so a missing variable
/// shows up as an outage instead of an open door.
pub async fn warm_cache(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<WarmSummary>, Response> {
    let secret = match &state.cron_secret {
        Some(secret) => secret,
        None => {
            warn!("warm endpoint called but no cron secret is configured");
            return Err(refuse(
                StatusCode::SERVICE_UNAVAILABLE,
                "cron endpoint disabled",
            ));
        }
    };

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token == secret)
        .unwrap_or(false);
    if !authorized {
        warn!("warm endpoint refused an unauthorized caller");
        return Err(refuse(StatusCode::UNAUTHORIZED, "unauthorized"));
    }

    let summary = warm_caches(&state.bcra)
        .await
        .map_err(|e| ApiError(e).into_response())?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::duales::TamarCallClient;
    use crate::bcra::{BcraClient, HttpReply, MockBcraGateway};
    use crate::config::{PipelineConfig, ServiceConfig};
    use crate::constants::STATIC_VARIABLE_IDS;
    use crate::markets::MarketsClient;
    use std::time::{Duration, Instant};

    fn test_state(gateway: MockBcraGateway, cron_secret: Option<&str>) -> Arc<AppState> {
        let config = ServiceConfig::default();
        let pipeline = PipelineConfig {
            rate_limit_max: 1000,
            rate_limit_window: Duration::from_millis(10),
            retry_delay: Duration::from_millis(1),
            ..PipelineConfig::default()
        };
        Arc::new(AppState {
            bcra: Arc::new(BcraClient::with_gateway(Arc::new(gateway), None, pipeline)),
            markets: Arc::new(MarketsClient::new(&config).expect("markets client")),
            tamar: TamarCallClient::new(&config).expect("tamar client"),
            cron_secret: cron_secret.map(str::to_string),
            started: Instant::now(),
        })
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().expect("header value"),
        );
        headers
    }

    #[tokio::test]
    async fn test_disabled_without_secret() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(0);
        let state = test_state(gateway, None);

        let response = warm_cache(State(state), bearer("anything"))
            .await
            .expect_err("disabled endpoint");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_rejects_bad_token() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(0);
        let state = test_state(gateway, Some("topsecret"));

        let response = warm_cache(State(state.clone()), bearer("wrong"))
            .await
            .expect_err("bad token");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = warm_cache(State(state), HeaderMap::new())
            .await
            .expect_err("missing header");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_authorized_call_runs_warm_pass() {
        let listing = r#"{"status":200,"results":[{"idVariable":1,"descripcion":"Reservas","categoria":"Principales Variables","fecha":"2025-08-15","valor":41250.0}]}"#;
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().returning(move |_| {
            Ok(HttpReply {
                status: 200,
                body: listing.to_string(),
            })
        });
        let state = test_state(gateway, Some("topsecret"));

        let summary = warm_cache(State(state), bearer("topsecret"))
            .await
            .expect("authorized run")
            .0;
        assert_eq!(summary.series_total, STATIC_VARIABLE_IDS.len());
        assert_eq!(summary.series_warmed, STATIC_VARIABLE_IDS.len() as u32);
        assert_eq!(summary.series_failed, 0);
    }
}
