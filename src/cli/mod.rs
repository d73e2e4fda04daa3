//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for the service: the API server,
//! the cache warm job and a handful of terminal reports over the same
//! clients the server uses.

use clap::{Parser, Subcommand};

/// macrovivo - BCRA statistics and Argentine market analytics service
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the JSON API server
    Serve {
        /// Bind port (overrides the PORT environment variable)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Warm the caches and mirror payloads into the fallback store
    WarmCache,

    /// Print the monetary-variables listing or one variable's series
    Variables {
        /// Fetch the time series for this variable instead of the listing
        #[arg(long)]
        id: Option<u32>,
        /// Series start date, YYYY-MM-DD
        #[arg(long)]
        desde: Option<String>,
        /// Series end date, YYYY-MM-DD
        #[arg(long)]
        hasta: Option<String>,
        /// Maximum series rows to fetch (upstream cap 3000)
        #[arg(long, default_value_t = 1000)]
        limit: u32,
        /// Print the raw JSON payload instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Consolidated debtor-registry report for a CUIT/CUIL
    Debtor {
        /// 11-digit tax identifier
        cuit: String,
    },

    /// Print the fixed-rate (letras and bonos) yield table
    Fija,

    /// Print the carry-trade table against the MEP dollar
    Carry,

    /// Compound a peso amount through historical and live inflation
    Inflation {
        /// Start month, YYYY-MM (inclusive)
        #[arg(long)]
        desde: String,
        /// End month, YYYY-MM (exclusive)
        #[arg(long)]
        hasta: String,
        /// Starting amount for the projection
        #[arg(long, default_value_t = 100.0)]
        monto: f64,
    },
}
