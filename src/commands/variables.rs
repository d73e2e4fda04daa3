//! Variables listing and series command handler.

use chrono::NaiveDate;

use crate::bcra::{BcraClient, MonetaryVariable};
use crate::config::{PipelineConfig, ServiceConfig};
use crate::constants::variable_group;
use crate::error::FetchError;

/// Print the monetary-variables listing, or one variable's time series
/// when `--id` is given, as a table or raw JSON.
pub async fn run_variables(
    config: ServiceConfig,
    id: Option<u32>,
    desde: Option<String>,
    hasta: Option<String>,
    limit: u32,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = BcraClient::new(&config, PipelineConfig::default()).await?;

    if let Some(variable_id) = id {
        let desde = parse_arg_date(desde.as_deref())?;
        let hasta = parse_arg_date(hasta.as_deref())?;
        let series = client
            .variable_time_series(variable_id, desde, hasta, 0, limit)
            .await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&series)?);
            return Ok(());
        }
        println!("{:<10}  {:>18}", "FECHA", "VALOR");
        for point in &series.results {
            println!("{}  {:>18.2}", point.fecha, point.valor);
        }
        return Ok(());
    }

    let listing = client.monetary_variables().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let principales = variable_group("key_metrics").unwrap_or(&[]);
    println!("Principales variables");
    print_rows(
        listing
            .results
            .iter()
            .filter(|v| principales.contains(&v.id_variable)),
    );
    println!("\nTodas las variables");
    print_rows(listing.results.iter());
    Ok(())
}

fn parse_arg_date(value: Option<&str>) -> Result<Option<NaiveDate>, FetchError> {
    match value {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            FetchError::InvalidParameter(format!("invalid date '{}', expected YYYY-MM-DD", raw))
        }),
    }
}

fn print_rows<'a>(rows: impl Iterator<Item = &'a MonetaryVariable>) {
    println!("{:>4}  {:<10}  {:>18}  DESCRIPCION", "ID", "FECHA", "VALOR");
    for variable in rows {
        println!(
            "{:>4}  {}  {:>18.2}  {}",
            variable.id_variable, variable.fecha, variable.valor, variable.descripcion
        );
    }
}
