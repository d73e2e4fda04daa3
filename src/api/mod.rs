//! JSON API server.
//!
//! One router exposes the statistics and debtor proxies, the analytics
//! tables, the secret-guarded warm endpoint, and the health and metrics
//! surfaces. Handlers share a single [`AppState`] carrying the upstream
//! clients; all per-request work happens inside them.

pub mod cron;
pub mod error;
pub mod health;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tracing::{error, info};

use crate::analytics::duales::TamarCallClient;
use crate::bcra::BcraClient;
use crate::markets::MarketsClient;
use crate::metrics;

/// Shared clients and settings behind every handler.
pub struct AppState {
    pub bcra: Arc<BcraClient>,
    pub markets: Arc<MarketsClient>,
    pub tamar: TamarCallClient,
    pub cron_secret: Option<String>,
    pub started: Instant,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/monetarias", get(routes::monetarias))
        .route("/api/monetarias/:id", get(routes::monetarias_series))
        .route("/api/deudores/:cuit", get(routes::debtor))
        .route("/api/deudores/:cuit/historicas", get(routes::debtor_history))
        .route("/api/deudores/:cuit/cheques", get(routes::debtor_cheques))
        .route("/api/mep", get(routes::mep))
        .route("/api/acciones", get(routes::acciones_table))
        .route("/api/fija", get(routes::fija_table))
        .route("/api/carry", get(routes::carry_table))
        .route("/api/duales", get(routes::duales_simulation))
        .route("/api/duales/call-value", post(routes::duales_call_value))
        .route("/api/inflacion", get(routes::inflacion))
        .route("/api/cron/warm-cache", get(cron::warm_cache))
        .with_state(state)
}

async fn metrics_endpoint() -> String {
    metrics::gather_metrics()
}

/// Bind and run the API server until it fails or the process stops.
pub async fn serve(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind API server");
            return Err(e);
        }
    };
    info!(%addr, "API server listening");

    axum::serve(listener, app).await
}
