use std::time::Instant;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atlas_core::price_shock;

use super::common::envelope;
use crate::input;

#[derive(Args)]
pub struct PriceShockArgs {
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct PriceShockRequest {
    crop: String,
    baseline_yield_tons: f64,
    stressed_yield_tons: f64,
}

pub fn run_price_shock(args: PriceShockArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: PriceShockRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required".into());
    };

    let report = price_shock::calculate_price_shock(
        &request.crop,
        request.baseline_yield_tons,
        request.stressed_yield_tons,
    )?;
    Ok(envelope(
        "supply-elasticity price pass-through: %price = %yield_loss / elasticity",
        &request,
        Vec::new(),
        start,
        report,
    ))
}
