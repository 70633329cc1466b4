use std::time::Instant;

use clap::Args;
use serde_json::Value;

use atlas_core::scenario_runner::{self, ProjectKind};

use super::common::{envelope, fetch_hazard, provenance_warning, read_scenario_request};

#[derive(Args)]
pub struct CoastalArgs {
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_coastal(args: CoastalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request = read_scenario_request(&args.input)?;
    if request.asset.project_type != ProjectKind::Coastal {
        return Err("asset.project_type must be \"Coastal\" for this command".into());
    }
    let hazard = fetch_hazard(&request.asset);
    let warnings = provenance_warning(&hazard);
    let report = scenario_runner::run(&request.asset, &request.scenario, &hazard, request.seed.unwrap_or(0))?;
    Ok(envelope(
        "coastal run-up -> lifespan/OPEX rescue -> financial -> Monte-Carlo NPV uncertainty pipeline",
        &request,
        warnings,
        start,
        report,
    ))
}
