use std::time::Instant;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atlas_core::hazard::FallbackHazardProvider;
use atlas_core::rating;
use atlas_core::scenario_runner::{Asset, Scenario};

use super::common::envelope;
use crate::input;

#[derive(Args)]
pub struct RatingArgs {
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RatingRequest {
    asset: Asset,
    base_scenario: Scenario,
    #[serde(default)]
    seed: Option<u64>,
}

/// Run the 2030/2040/2050 time-travel sweep for one asset and classify its
/// outlook (spec.md §4.9).
pub fn run_rating(args: RatingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: RatingRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required".into());
    };

    let provider = FallbackHazardProvider;
    let trajectory = rating::run_time_travel_sweep(
        &request.asset,
        &request.base_scenario,
        &provider,
        request.seed.unwrap_or(0),
    )?;
    let outlook = rating::determine_outlook(trajectory);
    Ok(envelope(
        "2030/2040/2050 time-travel sweep -> rating-index comparison -> outlook classification",
        &request,
        Vec::new(),
        start,
        outlook,
    ))
}
