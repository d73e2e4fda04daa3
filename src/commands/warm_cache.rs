//! Warm-cache command handler.

use crate::bcra::BcraClient;
use crate::config::{PipelineConfig, ServiceConfig};
use crate::warm::warm_caches;

/// Run one warm pass from the terminal and print the summary as JSON.
pub async fn run_warm_cache(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = BcraClient::new(&config, PipelineConfig::default()).await?;
    let summary = warm_caches(&client).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
