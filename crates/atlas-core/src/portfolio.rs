//! Portfolio Engine: market-vs-asset NPV correlation classification and
//! resilient-yield portfolio volatility (spec.md §4.10). Correlation and
//! the "global average excluding this asset" benchmark are grounded
//! directly on `original_source/correlation_engine.py`'s
//! `calculate_global_average_excluding`/`calculate_correlation`/
//! `classify_correlation`.

use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::hazard::HazardSample;
use crate::monte_carlo::stats::{mean_and_stdev, sample_normal};
use crate::physics::agriculture::{calculate_yield_pct, Crop, SeedType};
use crate::rating::TemporalTrajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationClass {
    Hedge,
    Neutral,
    Concentrator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetCorrelation {
    pub asset_id: String,
    pub correlation_vs_global: f64,
    pub classification: CorrelationClass,
    pub npv_vector: Vec<f64>,
}

fn npv_vector(trajectory: &TemporalTrajectory) -> Vec<f64> {
    let mut samples = trajectory.samples.clone();
    samples.sort_by_key(|s| s.year);
    samples.iter().map(|s| s.npv_usd).collect()
}

/// Mean of all *other* assets' NPV vectors — the "market" benchmark
/// (`correlation_engine.py::calculate_global_average_excluding`).
fn global_average_excluding(vectors: &[Vec<f64>], exclude_idx: usize) -> Vec<f64> {
    let len = vectors[0].len();
    let mut sums = vec![0.0; len];
    let mut count = 0usize;
    for (i, v) in vectors.iter().enumerate() {
        if i == exclude_idx {
            continue;
        }
        for (s, value) in sums.iter_mut().zip(v.iter()) {
            *s += value;
        }
        count += 1;
    }
    if count == 0 {
        return vec![0.0; len];
    }
    sums.into_iter().map(|s| s / count as f64).collect()
}

/// Pearson correlation, collapsing zero-variance or NaN to `0.0`
/// (`correlation_engine.py::calculate_correlation`).
fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (mean_a, std_a) = mean_and_stdev(&a[..n]);
    let (mean_b, std_b) = mean_and_stdev(&b[..n]);
    if std_a == 0.0 || std_b == 0.0 {
        return 0.0;
    }
    let covariance: f64 = (0..n).map(|i| (a[i] - mean_a) * (b[i] - mean_b)).sum::<f64>() / n as f64;
    let correlation = covariance / (std_a * std_b);
    if correlation.is_nan() {
        0.0
    } else {
        correlation.clamp(-1.0, 1.0)
    }
}

/// `<0 -> Hedge, >0.8 -> Concentrator, else Neutral`
/// (`correlation_engine.py::classify_correlation`).
fn classify_correlation(correlation: f64) -> CorrelationClass {
    if correlation < 0.0 {
        CorrelationClass::Hedge
    } else if correlation > 0.8 {
        CorrelationClass::Concentrator
    } else {
        CorrelationClass::Neutral
    }
}

/// Correlate every asset's NPV trajectory against the mean of its peers'.
/// Requires at least two assets with equal-length trajectories.
pub fn calculate_portfolio_correlations(
    asset_ids: &[String],
    trajectories: &[TemporalTrajectory],
) -> Result<Vec<AssetCorrelation>, AtlasError> {
    if asset_ids.len() != trajectories.len() {
        return Err(AtlasError::invalid(
            "trajectories",
            "asset_ids and trajectories must be the same length",
        ));
    }
    if trajectories.len() < 2 {
        return Err(AtlasError::invalid(
            "trajectories",
            "at least two assets are required for correlation analysis",
        ));
    }

    let vectors: Vec<Vec<f64>> = trajectories.iter().map(npv_vector).collect();
    let len = vectors[0].len();
    if vectors.iter().any(|v| v.len() != len) {
        return Err(AtlasError::invalid(
            "trajectories",
            "all NPV vectors must share the same number of samples",
        ));
    }

    let mut results = Vec::with_capacity(vectors.len());
    for (i, vector) in vectors.iter().enumerate() {
        let market = global_average_excluding(&vectors, i);
        let correlation = pearson_correlation(vector, &market);
        results.push(AssetCorrelation {
            asset_id: asset_ids[i].clone(),
            correlation_vs_global: correlation,
            classification: classify_correlation(correlation),
            npv_vector: vector.clone(),
        });
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// Portfolio volatility
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub correlations: Vec<AssetCorrelation>,
    pub volatility_pct: f64,
    pub risk_band: RiskBand,
}

fn risk_band_for(volatility_pct: f64) -> RiskBand {
    if volatility_pct < 10.0 {
        RiskBand::Low
    } else if volatility_pct < 20.0 {
        RiskBand::Medium
    } else if volatility_pct < 30.0 {
        RiskBand::High
    } else {
        RiskBand::VeryHigh
    }
}

/// Coefficient of variation (percent) of `trials` resilient-yield resamples
/// for one location, perturbing the hazard sample with small Gaussian
/// noise per draw.
pub fn resilient_yield_cv_pct(
    crop: Crop,
    hazard: &HazardSample,
    trials: u32,
    seed: u64,
) -> Result<f64, AtlasError> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut yields = Vec::with_capacity(trials as usize);
    for _ in 0..trials {
        let temp = sample_normal(&mut rng, hazard.max_temp_celsius, 1.0)?;
        let rain = sample_normal(&mut rng, hazard.total_rain_mm, hazard.total_rain_mm * 0.05)?.max(0.0);
        yields.push(calculate_yield_pct(crop, temp, rain, Some(hazard.soil_ph), SeedType::Resilient));
    }
    let (mean, stdev) = mean_and_stdev(&yields);
    if mean == 0.0 {
        Ok(0.0)
    } else {
        Ok((stdev / mean * 100.0).abs())
    }
}

/// Portfolio volatility = mean CV across each location's 10-year
/// resilient-yield resamples (spec.md §4.10).
pub fn calculate_portfolio_volatility(
    crop: Crop,
    hazards: &[HazardSample],
    seed: u64,
) -> Result<f64, AtlasError> {
    if hazards.is_empty() {
        return Err(AtlasError::invalid("hazards", "at least one location is required"));
    }
    let mut cvs = Vec::with_capacity(hazards.len());
    for (i, hazard) in hazards.iter().enumerate() {
        cvs.push(resilient_yield_cv_pct(crop, hazard, 10, seed.wrapping_add(i as u64))?);
    }
    Ok(cvs.iter().sum::<f64>() / cvs.len() as f64)
}

/// Assemble the full portfolio report: correlations plus volatility/risk
/// band.
pub fn build_portfolio_report(
    asset_ids: &[String],
    trajectories: &[TemporalTrajectory],
    crop: Crop,
    hazards: &[HazardSample],
    seed: u64,
) -> Result<PortfolioReport, AtlasError> {
    let correlations = calculate_portfolio_correlations(asset_ids, trajectories)?;
    let volatility_pct = calculate_portfolio_volatility(crop, hazards, seed)?;
    Ok(PortfolioReport {
        correlations,
        volatility_pct,
        risk_band: risk_band_for(volatility_pct),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::{FallbackHazardProvider, HazardProvider, WeatherWindow};
    use crate::rating::TemporalSample;

    fn trajectory(npvs: [f64; 3]) -> TemporalTrajectory {
        TemporalTrajectory {
            samples: vec![
                TemporalSample { year: 2030, npv_usd: npvs[0], default_probability: 0.1, rating: "A".to_string() },
                TemporalSample { year: 2040, npv_usd: npvs[1], default_probability: 0.1, rating: "A".to_string() },
                TemporalSample { year: 2050, npv_usd: npvs[2], default_probability: 0.1, rating: "A".to_string() },
            ],
        }
    }

    #[test]
    fn negative_correlation_classifies_as_hedge() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let trajectories = vec![
            trajectory([100.0, 200.0, 300.0]),
            trajectory([100.0, 200.0, 300.0]),
            trajectory([300.0, 200.0, 100.0]),
        ];
        let correlations = calculate_portfolio_correlations(&ids, &trajectories).unwrap();
        assert_eq!(correlations[2].classification, CorrelationClass::Hedge);
        assert!(correlations[2].correlation_vs_global < 0.0);
    }

    #[test]
    fn identical_trajectories_classify_as_concentrator() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let trajectories = vec![
            trajectory([100.0, 200.0, 300.0]),
            trajectory([100.0, 200.0, 300.0]),
            trajectory([100.0, 200.0, 300.0]),
        ];
        let correlations = calculate_portfolio_correlations(&ids, &trajectories).unwrap();
        for c in &correlations {
            assert_eq!(c.classification, CorrelationClass::Concentrator);
        }
    }

    #[test]
    fn zero_variance_trajectory_collapses_to_neutral() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let trajectories = vec![
            trajectory([100.0, 100.0, 100.0]),
            trajectory([100.0, 200.0, 300.0]),
            trajectory([300.0, 200.0, 400.0]),
        ];
        let correlations = calculate_portfolio_correlations(&ids, &trajectories).unwrap();
        assert_eq!(correlations[0].correlation_vs_global, 0.0);
        assert_eq!(correlations[0].classification, CorrelationClass::Neutral);
    }

    #[test]
    fn requires_at_least_two_assets() {
        let ids = vec!["a".to_string()];
        let trajectories = vec![trajectory([100.0, 200.0, 300.0])];
        assert!(calculate_portfolio_correlations(&ids, &trajectories).is_err());
    }

    #[test]
    fn risk_bands_match_spec_thresholds() {
        assert_eq!(risk_band_for(5.0), RiskBand::Low);
        assert_eq!(risk_band_for(15.0), RiskBand::Medium);
        assert_eq!(risk_band_for(25.0), RiskBand::High);
        assert_eq!(risk_band_for(50.0), RiskBand::VeryHigh);
    }

    #[test]
    fn portfolio_volatility_is_nonnegative() {
        let hazards: Vec<HazardSample> = [(25.0, -80.0), (10.0, 40.0), (-20.0, 120.0)]
            .iter()
            .map(|&(lat, lon)| FallbackHazardProvider.weather(lat, lon, WeatherWindow::Annual))
            .collect();
        let volatility = calculate_portfolio_volatility(Crop::Maize, &hazards, 3).unwrap();
        assert!(volatility >= 0.0);
    }
}
