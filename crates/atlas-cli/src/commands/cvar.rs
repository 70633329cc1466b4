use std::time::Instant;

use clap::Args;
use serde_json::Value;

use atlas_core::cancellation::CancellationToken;
use atlas_core::monte_carlo::cvar::{self, CvarInput};

use super::common::envelope;
use crate::input;

#[derive(Args)]
pub struct CvarArgs {
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_cvar(args: CvarArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let cvar_input: CvarInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required".into());
    };

    let token = CancellationToken::new();
    let output = cvar::run_cvar_simulation(&cvar_input, &token)?;
    Ok(envelope(
        "normal damage-distribution Monte-Carlo with 40-bin histogram",
        &cvar_input,
        Vec::new(),
        start,
        output,
    ))
}
