use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use macrovivo::cli::{Cli, Commands};
use macrovivo::commands;
use macrovivo::config::ServiceConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file
    dotenv().ok();

    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when both are set.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.verbose));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServiceConfig::from_env();

    match cli.command {
        Commands::Serve { port } => commands::run_serve(config, port).await?,
        Commands::WarmCache => commands::run_warm_cache(config).await?,
        Commands::Variables {
            id,
            desde,
            hasta,
            limit,
            json,
        } => commands::run_variables(config, id, desde, hasta, limit, json).await?,
        Commands::Debtor { cuit } => commands::run_debtor(config, cuit).await?,
        Commands::Fija => commands::run_fija(config).await?,
        Commands::Carry => commands::run_carry(config).await?,
        Commands::Inflation {
            desde,
            hasta,
            monto,
        } => commands::run_inflation(config, desde, hasta, monto).await?,
    }

    Ok(())
}
