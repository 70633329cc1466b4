//! CVaR reporting harness: sample annual damage percentages from a normal
//! distribution, floor at zero, multiply by asset value; aggregate mean,
//! p95/p99 (VaR95/VaR99 in USD), and a 40-bin histogram.

use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cancellation::CancellationToken;
use crate::error::AtlasError;
use crate::monte_carlo::stats::{build_histogram, percentile_sorted, HistogramBin};

/// 40 bins, fixed by spec.md §4.5 (distinct from the donor's default of 20).
pub const CVAR_HISTOGRAM_BINS: usize = 40;

/// Cancellation checkpoint cadence.
pub const CHECKPOINT_EVERY: u32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvarInput {
    pub asset_value_usd: f64,
    pub mean_damage_pct: f64,
    pub volatility_pct: f64,
    pub num_simulations: u32,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvarOutput {
    pub expected_loss_usd: f64,
    pub var_95_usd: f64,
    pub var_99_usd: f64,
    pub cvar_95_usd: f64,
    pub histogram: Vec<HistogramBin>,
    pub num_simulations_run: u32,
    pub incomplete: bool,
}

/// Run the CVaR Monte-Carlo harness. `seed` makes the run reproducible
/// (R1): the same input and seed always produce the same output.
pub fn run_cvar_simulation(
    input: &CvarInput,
    token: &CancellationToken,
) -> Result<CvarOutput, AtlasError> {
    if input.num_simulations == 0 {
        return Err(AtlasError::invalid(
            "num_simulations",
            "must be greater than zero",
        ));
    }
    if input.asset_value_usd < 0.0 {
        return Err(AtlasError::invalid("asset_value_usd", "must be non-negative"));
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(input.seed);
    let mut losses = Vec::with_capacity(input.num_simulations as usize);
    let mut incomplete = false;

    for i in 0..input.num_simulations {
        if i % CHECKPOINT_EVERY == 0 && token.is_cancelled() {
            incomplete = true;
            break;
        }
        let damage_pct = crate::monte_carlo::stats::sample_normal(
            &mut rng,
            input.mean_damage_pct,
            input.volatility_pct,
        )?
        .max(0.0);
        losses.push(damage_pct * input.asset_value_usd);
    }

    if losses.is_empty() {
        return Ok(CvarOutput {
            expected_loss_usd: 0.0,
            var_95_usd: 0.0,
            var_99_usd: 0.0,
            cvar_95_usd: 0.0,
            histogram: Vec::new(),
            num_simulations_run: 0,
            incomplete: true,
        });
    }

    losses.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let expected_loss_usd = losses.iter().sum::<f64>() / losses.len() as f64;
    let var_95_usd = percentile_sorted(&losses, 95.0);
    let var_99_usd = percentile_sorted(&losses, 99.0);

    let tail: Vec<f64> = losses.iter().copied().filter(|&l| l >= var_95_usd).collect();
    let cvar_95_usd = if tail.is_empty() {
        var_95_usd
    } else {
        tail.iter().sum::<f64>() / tail.len() as f64
    };

    let histogram = build_histogram(&losses, CVAR_HISTOGRAM_BINS);

    Ok(CvarOutput {
        expected_loss_usd,
        var_95_usd,
        var_99_usd,
        cvar_95_usd,
        histogram,
        num_simulations_run: losses.len() as u32,
        incomplete,
    })
}
