use std::time::Instant;

use clap::Args;
use serde_json::Value;

use atlas_core::financial::{self, CbaInputs};

use super::common::envelope;
use crate::input;

#[derive(Args)]
pub struct CbaArgs {
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_cba(args: CbaArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let inputs: CbaInputs = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required".into());
    };

    let series = financial::calculate_cba_time_series(&inputs);
    Ok(envelope(
        "multi-year discounted CBA time series: (baseline damage + insurance) vs (OPEX + residual damage + reduced insurance - carbon revenue)",
        &inputs,
        Vec::new(),
        start,
        series,
    ))
}
