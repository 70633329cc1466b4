use std::time::Instant;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atlas_core::hazard::{FallbackHazardProvider, HazardProvider};
use atlas_core::physics::agriculture::Crop;
use atlas_core::portfolio;
use atlas_core::rating;
use atlas_core::scenario_runner::{Asset, Scenario};

use super::common::envelope;
use crate::input;

#[derive(Args)]
pub struct PortfolioArgs {
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct PortfolioRequest {
    assets: Vec<Asset>,
    base_scenario: Scenario,
    crop: Crop,
    #[serde(default)]
    seed: Option<u64>,
}

/// Build the portfolio-level report: per-asset NPV correlation vs. the
/// peer-average benchmark plus aggregate resilient-yield volatility
/// (spec.md §4.10).
pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: PortfolioRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required".into());
    };

    let seed = request.seed.unwrap_or(0);
    let provider = FallbackHazardProvider;

    let mut asset_ids = Vec::with_capacity(request.assets.len());
    let mut trajectories = Vec::with_capacity(request.assets.len());
    let mut hazards = Vec::with_capacity(request.assets.len());
    for asset in &request.assets {
        asset_ids.push(asset.id.clone());
        trajectories.push(rating::run_time_travel_sweep(asset, &request.base_scenario, &provider, seed)?);
        let (lat, lon) = asset.geometry.representative_point();
        hazards.push(provider.weather(lat, lon, atlas_core::hazard::WeatherWindow::Annual));
    }

    let report = portfolio::build_portfolio_report(&asset_ids, &trajectories, request.crop, &hazards, seed)?;
    Ok(envelope(
        "per-asset NPV-vs-peer-average Pearson correlation + resilient-yield volatility",
        &request,
        Vec::new(),
        start,
        report,
    ))
}
