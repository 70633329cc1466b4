mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::process;
use tracing::{error, info};

use commands::agriculture::AgricultureArgs;
use commands::batch::BatchArgs;
use commands::cba::CbaArgs;
use commands::coastal::CoastalArgs;
use commands::cvar::CvarArgs;
use commands::flash_flood::FlashFloodArgs;
use commands::flood::FloodArgs;
use commands::health::HealthArgs;
use commands::polygon::PolygonArgs;
use commands::portfolio::PortfolioArgs;
use commands::price_shock::PriceShockArgs;
use commands::rating::RatingArgs;

/// Climate-resilience risk simulation and rating engine
#[derive(Parser)]
#[command(
    name = "atlas",
    version,
    about = "Climate-resilience risk simulation and rating engine",
    long_about = "A CLI for the Atlas climate-resilience risk simulation and rating engine. \
                  Runs the Scenario Runner pipeline (hazard, physics, lifespan, financial, \
                  Monte-Carlo) for agriculture, coastal, urban-flood, flash-flood, and health \
                  projects, plus standalone spatial, price-shock, CBA, CVaR, batch, portfolio, \
                  and rating sweeps."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agriculture project pipeline
    Agriculture(AgricultureArgs),
    /// Run the coastal project pipeline
    Coastal(CoastalArgs),
    /// Run the urban-flood project pipeline
    Flood(FloodArgs),
    /// Run the flash-flood project pipeline
    FlashFlood(FlashFloodArgs),
    /// Run the health project pipeline
    Health(HealthArgs),
    /// Standalone GeoJSON polygon exposure and monetary scaling
    Polygon(PolygonArgs),
    /// Commodity price-shock and revenue-impact calculator
    PriceShock(PriceShockArgs),
    /// Multi-year cost-benefit/carbon time series
    Cba(CbaArgs),
    /// Conditional value-at-risk Monte-Carlo harness
    Cvar(CvarArgs),
    /// Batch-run the Scenario Runner over a CSV or JSON list of assets
    Batch(BatchArgs),
    /// Portfolio correlation and resilient-yield volatility
    Portfolio(PortfolioArgs),
    /// Time-travel rating sweep and outlook classification
    Rating(RatingArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Agriculture(_) => "agriculture",
        Commands::Coastal(_) => "coastal",
        Commands::Flood(_) => "flood",
        Commands::FlashFlood(_) => "flash-flood",
        Commands::Health(_) => "health",
        Commands::Polygon(_) => "polygon",
        Commands::PriceShock(_) => "price-shock",
        Commands::Cba(_) => "cba",
        Commands::Cvar(_) => "cvar",
        Commands::Batch(_) => "batch",
        Commands::Portfolio(_) => "portfolio",
        Commands::Rating(_) => "rating",
        Commands::Version => "version",
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let settings = atlas_core::AtlasSettings::from_env();

    info!(command = command_name(&cli.command), "dispatching command");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Agriculture(args) => commands::agriculture::run_agriculture(args),
        Commands::Coastal(args) => commands::coastal::run_coastal(args),
        Commands::Flood(args) => commands::flood::run_flood(args),
        Commands::FlashFlood(args) => commands::flash_flood::run_flash_flood(args),
        Commands::Health(args) => commands::health::run_health(args),
        Commands::Polygon(args) => commands::polygon::run_polygon(args),
        Commands::PriceShock(args) => commands::price_shock::run_price_shock(args),
        Commands::Cba(args) => commands::cba::run_cba(args),
        Commands::Cvar(args) => commands::cvar::run_cvar(args),
        Commands::Batch(args) => commands::batch::run_batch(args, &settings),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args),
        Commands::Rating(args) => commands::rating::run_rating(args),
        Commands::Version => {
            println!("atlas {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            // Error body stays structured JSON on stdout, never free text on
            // stderr, so callers never special-case the failure path.
            let code = e
                .downcast_ref::<atlas_core::AtlasError>()
                .map(|ae| ae.kind())
                .unwrap_or("INTERNAL");
            error!(code, message = %e, "command failed");
            let body = serde_json::json!({
                "status": "error",
                "code": code,
                "message": e.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
            process::exit(1);
        }
    }
}
