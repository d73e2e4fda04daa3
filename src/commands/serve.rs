//! Serve command handler.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::analytics::duales::TamarCallClient;
use crate::api::{self, AppState};
use crate::bcra::BcraClient;
use crate::config::{PipelineConfig, ServiceConfig};
use crate::markets::MarketsClient;

/// Build the shared clients and run the API server until it stops.
pub async fn run_serve(
    config: ServiceConfig,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = port.unwrap_or(config.port);

    let bcra = Arc::new(BcraClient::new(&config, PipelineConfig::default()).await?);
    let markets = Arc::new(MarketsClient::new(&config)?);
    let tamar = TamarCallClient::new(&config)?;

    info!(
        fallback = bcra.has_fallback(),
        cron = config.cron_secret.is_some(),
        "starting API server"
    );

    let state = Arc::new(AppState {
        bcra,
        markets,
        tamar,
        cron_secret: config.cron_secret,
        started: Instant::now(),
    });
    api::serve(state, port).await?;
    Ok(())
}
