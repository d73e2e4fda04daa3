//! Inflation calculator command handler.

use crate::analytics::inflation::{calculate, inflation_rates, parse_month};
use crate::bcra::BcraClient;
use crate::config::{PipelineConfig, ServiceConfig};
use crate::error::FetchError;

/// Compound a peso amount between two months and print the summary.
pub async fn run_inflation(
    config: ServiceConfig,
    desde: String,
    hasta: String,
    monto: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = parse_month(&desde)?;
    let end = parse_month(&hasta)?;
    if !monto.is_finite() || monto <= 0.0 {
        return Err(
            FetchError::InvalidParameter("monto must be a positive number".to_string()).into(),
        );
    }

    let client = BcraClient::new(&config, PipelineConfig::default()).await?;
    let rates = inflation_rates(&client).await;
    let summary = calculate(&rates, start, monto, end);

    println!(
        "$ {:.2} de {} equivalen a $ {:.2} de {}",
        summary.start_value, summary.start_label, summary.end_value, summary.end_label
    );
    println!(
        "Inflación acumulada: {:.2}%",
        summary.total_increment_pct * 100.0
    );
    println!("Promedio mensual:    {:.2}%", summary.monthly_avg_pct * 100.0);
    println!("Anualizada:          {:.2}%", summary.annualized_pct * 100.0);
    println!("Meses:               {}", summary.total_months);
    Ok(())
}
