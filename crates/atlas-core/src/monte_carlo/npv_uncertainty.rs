//! NPV uncertainty harness feeding Rating: perturb driver inputs, re-run a
//! caller-supplied deterministic pipeline `K` times, and aggregate
//! `{mean, stdev, VaR95, VaR99, default_probability, confidence}`.
//!
//! Decoupled from [`crate::scenario_runner`] by taking the per-trial NPV
//! function as a closure — the Scenario Runner supplies a closure that
//! perturbs its own drivers (temp_delta, rain_pct_change, slr, intensity)
//! and re-runs its pure pipeline; this module only owns the sampling,
//! aggregation, and cancellation-checkpoint loop.

use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cancellation::CancellationToken;
use crate::error::AtlasError;
use crate::monte_carlo::cvar::CHECKPOINT_EVERY;
use crate::monte_carlo::stats::{mean_and_stdev, percentile_sorted, sample_normal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverDistribution {
    pub mean: f64,
    pub std_dev: f64,
}

/// The four perturbable drivers named in spec.md §4.5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverDistributions {
    pub temp_delta: DriverDistribution,
    pub rain_pct_change: DriverDistribution,
    pub slr_projection_m: DriverDistribution,
    pub rain_intensity_pct: DriverDistribution,
}

/// One perturbed draw of the four drivers for a single trial.
#[derive(Debug, Clone, Copy)]
pub struct DriverDraw {
    pub temp_delta: f64,
    pub rain_pct_change: f64,
    pub slr_projection_m: f64,
    pub rain_intensity_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub mean_npv: f64,
    pub stdev_npv: f64,
    pub var_95: f64,
    pub var_99: f64,
    pub default_probability: f64,
    pub confidence: Confidence,
    pub trials_run: u32,
    pub incomplete: bool,
}

/// Confidence tier from the coefficient of variation (§3/§4.5): `mean<=0`
/// collapses to Low; otherwise `cv<0.2` High, `cv<0.5` Medium, else Low.
/// The `stdev=0, mean>0 -> High` tie-break falls out of `cv=0<0.2`
/// automatically, with no special case needed.
pub fn confidence_tier(mean: f64, stdev: f64) -> Confidence {
    if mean <= 0.0 {
        return Confidence::Low;
    }
    let cv = stdev / mean;
    if cv < 0.2 {
        Confidence::High
    } else if cv < 0.5 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Run the NPV uncertainty harness. `trials` is `K`; `npv_for_draw` is the
/// caller's pure per-trial pipeline, invoked once per draw.
pub fn run_npv_uncertainty(
    distributions: &DriverDistributions,
    trials: u32,
    seed: u64,
    token: &CancellationToken,
    mut npv_for_draw: impl FnMut(DriverDraw) -> f64,
) -> Result<MonteCarloResult, AtlasError> {
    if trials == 0 {
        return Err(AtlasError::invalid("trials", "must be greater than zero"));
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut npvs = Vec::with_capacity(trials as usize);
    let mut incomplete = false;

    for i in 0..trials {
        if i % CHECKPOINT_EVERY == 0 && token.is_cancelled() {
            incomplete = true;
            break;
        }
        let draw = DriverDraw {
            temp_delta: sample_normal(
                &mut rng,
                distributions.temp_delta.mean,
                distributions.temp_delta.std_dev,
            )?,
            rain_pct_change: sample_normal(
                &mut rng,
                distributions.rain_pct_change.mean,
                distributions.rain_pct_change.std_dev,
            )?,
            slr_projection_m: sample_normal(
                &mut rng,
                distributions.slr_projection_m.mean,
                distributions.slr_projection_m.std_dev,
            )?
            .max(0.0),
            rain_intensity_pct: sample_normal(
                &mut rng,
                distributions.rain_intensity_pct.mean,
                distributions.rain_intensity_pct.std_dev,
            )?,
        };
        npvs.push(npv_for_draw(draw));
    }

    if npvs.is_empty() {
        return Ok(MonteCarloResult {
            mean_npv: 0.0,
            stdev_npv: 0.0,
            var_95: 0.0,
            var_99: 0.0,
            default_probability: 0.0,
            confidence: Confidence::Low,
            trials_run: 0,
            incomplete: true,
        });
    }

    let (mean_npv, stdev_npv) = mean_and_stdev(&npvs);
    let mut sorted = npvs.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let var_95 = percentile_sorted(&sorted, 5.0);
    let var_99 = percentile_sorted(&sorted, 1.0);
    let default_probability =
        npvs.iter().filter(|&&n| n < 0.0).count() as f64 / npvs.len() as f64;

    Ok(MonteCarloResult {
        mean_npv,
        stdev_npv,
        var_95,
        var_99,
        default_probability,
        confidence: confidence_tier(mean_npv, stdev_npv),
        trials_run: npvs.len() as u32,
        incomplete,
    })
}
