//! Rating & Outlook: credit rating bands, sector percentile ranking, and
//! the Time-Travel outlook sweep (spec.md §4.9). Rating-order comparison
//! and downgrade-year interpolation are grounded directly on
//! `original_source/outlook_engine.py`'s `RATING_ORDER`/`determine_outlook`/
//! `estimate_downgrade_year`.

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::hazard::{HazardProvider, WeatherWindow};
use crate::scenario_runner::{Asset, ProjectKind, Report, Scenario};

/// Best-to-worst rating scale, matching `outlook_engine.py::RATING_ORDER`.
pub const RATING_ORDER: [&str; 7] = ["AAA", "AA", "A", "BBB", "BB", "B", "C"];

/// Credit rating band from a default probability expressed as a fraction
/// in `[0, 1]` (Invariant 2/4 — internal convention is fractions, the
/// percent thresholds below are the one place spec.md states the bands).
pub fn assign_credit_rating(default_probability: f64) -> &'static str {
    let pct = default_probability * 100.0;
    if pct < 1.0 {
        "AAA"
    } else if pct < 5.0 {
        "AA"
    } else if pct < 10.0 {
        "A"
    } else if pct < 20.0 {
        "BBB"
    } else if pct < 30.0 {
        "BB"
    } else if pct < 50.0 {
        "B"
    } else {
        "C"
    }
}

pub fn investment_grade(rating: &str) -> bool {
    matches!(rating, "AAA" | "AA" | "A" | "BBB")
}

fn rating_index(rating: &str) -> usize {
    RATING_ORDER
        .iter()
        .position(|r| *r == rating)
        .unwrap_or(RATING_ORDER.len())
}

// ---------------------------------------------------------------------------
// Sector percentiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorPercentiles {
    pub npv_percentile: f64,
    pub roi_percentile: f64,
    pub risk_percentile: f64,
    pub composite_percentile: f64,
    /// Rank by NPV within the sector, 1-indexed, 1 = best.
    pub npv_rank: usize,
    /// Rank by ROI within the sector, 1-indexed, 1 = best.
    pub roi_rank: usize,
}

/// Percentile rank of `target` among its peers (`benchmarking_engine.py`'s
/// `calculate_percentile`): counts strictly-better/worse peers only,
/// excluding `target` itself, so a lone asset or a tie with every peer
/// never inflates to 100th percentile by counting against itself.
fn percentile_rank(values: &[f64], target: f64, higher_is_better: bool) -> f64 {
    if values.is_empty() || values.len() == 1 {
        return if higher_is_better { 100.0 } else { 0.0 };
    }
    let count_below = values
        .iter()
        .filter(|&&v| if higher_is_better { v < target } else { v > target })
        .count() as f64;
    (count_below / values.len() as f64 * 100.0 * 10.0).round() / 10.0
}

/// Per-asset-type ROI approximation (`benchmarking_engine.py::extract_metrics`):
/// agriculture divides NPV by CAPEX; coastal/urban-flood risk-adjust the
/// Monte-Carlo mean NPV against its 95% VaR; flash-flood/health carry no
/// ROI concept in the original and fall back to `0.0`.
fn roi_of(report: &Report) -> f64 {
    match report.project_type {
        ProjectKind::Agriculture => {
            let capex = report
                .financial
                .incremental_cash_flow
                .first()
                .map(|&cf0| -cf0)
                .unwrap_or(0.0);
            if capex > 0.0 {
                report.financial.npv_usd / capex * 100.0
            } else {
                0.0
            }
        }
        ProjectKind::Coastal | ProjectKind::UrbanFlood => {
            let npv = report.monte_carlo.mean_npv;
            let var_95 = report.monte_carlo.var_95;
            if var_95 > 0.0 {
                (npv - var_95) / var_95.max(1.0) * 100.0
            } else {
                npv * 10.0
            }
        }
        ProjectKind::FlashFlood | ProjectKind::Health => 0.0,
    }
}

/// 1-indexed rank lookup by descending value (`rank 1` = best), matching
/// `benchmarking_engine.py::benchmark_assets`'s `sorted(..., reverse=True)`
/// plus `enumerate` rank-table construction.
fn rank_lookup(indices: &[usize], values: &[f64]) -> std::collections::HashMap<usize, usize> {
    let mut order: Vec<usize> = (0..indices.len()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
        .into_iter()
        .enumerate()
        .map(|(rank, pos)| (indices[pos], rank + 1))
        .collect()
}

/// Percentile-rank each report within its own `project_type` sector.
/// `composite_percentile = 0.4*npv + 0.3*roi + 0.3*risk`.
pub fn compute_sector_percentiles(reports: &[Report]) -> Vec<SectorPercentiles> {
    let mut result = vec![
        SectorPercentiles {
            npv_percentile: 50.0,
            roi_percentile: 50.0,
            risk_percentile: 50.0,
            composite_percentile: 50.0,
            npv_rank: 1,
            roi_rank: 1,
        };
        reports.len()
    ];

    for sector in [
        ProjectKind::Agriculture,
        ProjectKind::Coastal,
        ProjectKind::UrbanFlood,
        ProjectKind::FlashFlood,
        ProjectKind::Health,
    ] {
        let indices: Vec<usize> = reports
            .iter()
            .enumerate()
            .filter(|(_, r)| r.project_type == sector)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            continue;
        }
        let npvs: Vec<f64> = indices.iter().map(|&i| reports[i].financial.npv_usd).collect();
        let rois: Vec<f64> = indices.iter().map(|&i| roi_of(&reports[i])).collect();
        let risks: Vec<f64> = indices
            .iter()
            .map(|&i| reports[i].monte_carlo.default_probability)
            .collect();
        let npv_ranks = rank_lookup(&indices, &npvs);
        let roi_ranks = rank_lookup(&indices, &rois);

        for (pos, &i) in indices.iter().enumerate() {
            let npv_pct = percentile_rank(&npvs, npvs[pos], true);
            let roi_pct = percentile_rank(&rois, rois[pos], true);
            let risk_pct = percentile_rank(&risks, risks[pos], false);
            result[i] = SectorPercentiles {
                npv_percentile: npv_pct,
                roi_percentile: roi_pct,
                risk_percentile: risk_pct,
                composite_percentile: ((0.4 * npv_pct + 0.3 * roi_pct + 0.3 * risk_pct) * 10.0)
                    .round()
                    / 10.0,
                npv_rank: npv_ranks[&i],
                roi_rank: roi_ranks[&i],
            };
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Time-Travel outlook sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalSample {
    pub year: i32,
    pub npv_usd: f64,
    pub default_probability: f64,
    pub rating: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalTrajectory {
    pub samples: Vec<TemporalSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outlook {
    Stable,
    NegativeWatch,
    Positive,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlookReport {
    pub outlook: Outlook,
    pub projected_downgrade_year: Option<i32>,
    pub stranded_asset_year: Option<i32>,
    pub trajectory: TemporalTrajectory,
}

const SWEEP_YEARS: [i32; 3] = [2030, 2040, 2050];

/// Interpolate `base`'s warming/SLR/rain-intensity drivers linearly toward
/// their value at `base.year` (assumed 2050) for an earlier sweep year.
fn interpolate_scenario(base: &Scenario, year: i32) -> Scenario {
    let target_year = base.year.max(2050) as f64;
    let fraction = ((year as f64 - 2020.0) / (target_year - 2020.0)).clamp(0.0, 1.0);
    Scenario {
        year,
        temp_delta: base.temp_delta * fraction,
        rain_pct_change: base.rain_pct_change * fraction,
        slr_projection_m: base.slr_projection_m * fraction,
        rain_intensity_pct: base.rain_intensity_pct * fraction,
        global_warming_c: base.global_warming_c * fraction,
    }
}

/// Re-run the Scenario Runner at 2030/2040/2050 in year-ascending order,
/// under scenarios interpolated linearly toward the `base` (2050) targets.
pub fn run_time_travel_sweep(
    asset: &Asset,
    base_scenario: &Scenario,
    provider: &dyn HazardProvider,
    seed: u64,
) -> Result<TemporalTrajectory, AtlasError> {
    let (lat, lon) = asset.geometry.representative_point();
    let hazard = provider.weather(lat, lon, WeatherWindow::Annual);

    let mut samples = Vec::with_capacity(SWEEP_YEARS.len());
    for &year in &SWEEP_YEARS {
        let scenario = interpolate_scenario(base_scenario, year);
        let report = crate::scenario_runner::run(asset, &scenario, &hazard, seed)?;
        samples.push(TemporalSample {
            year,
            npv_usd: report.financial.npv_usd,
            default_probability: report.monte_carlo.default_probability,
            rating: assign_credit_rating(report.monte_carlo.default_probability).to_string(),
        });
    }

    Ok(TemporalTrajectory { samples })
}

fn estimate_downgrade_year(idx_2030: usize, idx_2040: usize, idx_2050: usize) -> Option<i32> {
    if idx_2040 > idx_2030 {
        let denom = idx_2040.saturating_sub(idx_2030).max(1) as f64;
        let years_to_first_change = (10.0 * (1.0 / denom)) as i32;
        Some((2030 + years_to_first_change.max(1)).min(2040))
    } else if idx_2050 > idx_2030 {
        Some(if idx_2050 > idx_2040 { 2045 } else { 2038 })
    } else {
        None
    }
}

/// Linear interpolation of the first year the NPV crosses zero between
/// bracketing sweep samples.
fn stranded_asset_year(trajectory: &TemporalTrajectory) -> Option<i32> {
    for window in trajectory.samples.windows(2) {
        let (a, b) = (window[0], window[1]);
        if a.npv_usd >= 0.0 && b.npv_usd < 0.0 {
            let frac = a.npv_usd / (a.npv_usd - b.npv_usd);
            let year = a.year as f64 + frac * (b.year - a.year) as f64;
            return Some(year.round() as i32);
        }
    }
    None
}

/// Outlook classification from a 2030/2040/2050 temporal trajectory
/// (`outlook_engine.py::determine_outlook`).
pub fn determine_outlook(trajectory: TemporalTrajectory) -> OutlookReport {
    let by_year = |year: i32| trajectory.samples.iter().find(|s| s.year == year);

    let Some(sample_2030) = by_year(2030) else {
        return OutlookReport {
            outlook: Outlook::Unknown,
            projected_downgrade_year: None,
            stranded_asset_year: None,
            trajectory,
        };
    };
    let Some(sample_2050) = by_year(2050) else {
        return OutlookReport {
            outlook: Outlook::Unknown,
            projected_downgrade_year: None,
            stranded_asset_year: None,
            trajectory,
        };
    };

    let idx_2030 = rating_index(&sample_2030.rating);
    let idx_2050 = rating_index(&sample_2050.rating);
    let idx_2040 = by_year(2040).map(|s| rating_index(&s.rating)).unwrap_or(idx_2030);

    let (outlook, projected_downgrade_year) = match idx_2030.cmp(&idx_2050) {
        std::cmp::Ordering::Equal => (Outlook::Stable, None),
        std::cmp::Ordering::Less => (
            Outlook::NegativeWatch,
            estimate_downgrade_year(idx_2030, idx_2040, idx_2050),
        ),
        std::cmp::Ordering::Greater => (Outlook::Positive, None),
    };

    let stranded = stranded_asset_year(&trajectory);

    OutlookReport {
        outlook,
        projected_downgrade_year,
        stranded_asset_year: stranded,
        trajectory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::FallbackHazardProvider;
    use crate::scenario_runner::{AssetExposure, FinancialOverrides, Geometry, ProjectKind};

    #[test]
    fn rating_bands_match_spec_thresholds() {
        assert_eq!(assign_credit_rating(0.005), "AAA");
        assert_eq!(assign_credit_rating(0.03), "AA");
        assert_eq!(assign_credit_rating(0.08), "A");
        assert_eq!(assign_credit_rating(0.15), "BBB");
        assert_eq!(assign_credit_rating(0.25), "BB");
        assert_eq!(assign_credit_rating(0.40), "B");
        assert_eq!(assign_credit_rating(0.60), "C");
    }

    #[test]
    fn investment_grade_excludes_speculative_bands() {
        assert!(investment_grade("BBB"));
        assert!(!investment_grade("BB"));
        assert!(!investment_grade("C"));
    }

    #[test]
    fn stable_outlook_when_ratings_unchanged() {
        let trajectory = TemporalTrajectory {
            samples: vec![
                TemporalSample { year: 2030, npv_usd: 1000.0, default_probability: 0.02, rating: "AA".to_string() },
                TemporalSample { year: 2040, npv_usd: 900.0, default_probability: 0.02, rating: "AA".to_string() },
                TemporalSample { year: 2050, npv_usd: 800.0, default_probability: 0.02, rating: "AA".to_string() },
            ],
        };
        let report = determine_outlook(trajectory);
        assert_eq!(report.outlook, Outlook::Stable);
        assert!(report.projected_downgrade_year.is_none());
    }

    #[test]
    fn negative_watch_when_rating_worsens() {
        let trajectory = TemporalTrajectory {
            samples: vec![
                TemporalSample { year: 2030, npv_usd: 1000.0, default_probability: 0.02, rating: "AA".to_string() },
                TemporalSample { year: 2040, npv_usd: 200.0, default_probability: 0.25, rating: "BB".to_string() },
                TemporalSample { year: 2050, npv_usd: -500.0, default_probability: 0.55, rating: "C".to_string() },
            ],
        };
        let report = determine_outlook(trajectory);
        assert_eq!(report.outlook, Outlook::NegativeWatch);
        assert!(report.projected_downgrade_year.is_some());
        assert!(report.stranded_asset_year.is_some());
    }

    #[test]
    fn positive_outlook_when_rating_improves() {
        let trajectory = TemporalTrajectory {
            samples: vec![
                TemporalSample { year: 2030, npv_usd: -100.0, default_probability: 0.4, rating: "B".to_string() },
                TemporalSample { year: 2040, npv_usd: 100.0, default_probability: 0.1, rating: "A".to_string() },
                TemporalSample { year: 2050, npv_usd: 500.0, default_probability: 0.02, rating: "AA".to_string() },
            ],
        };
        let report = determine_outlook(trajectory);
        assert_eq!(report.outlook, Outlook::Positive);
    }

    #[test]
    fn unknown_outlook_when_sample_missing() {
        let trajectory = TemporalTrajectory {
            samples: vec![TemporalSample { year: 2040, npv_usd: 100.0, default_probability: 0.1, rating: "A".to_string() }],
        };
        let report = determine_outlook(trajectory);
        assert_eq!(report.outlook, Outlook::Unknown);
    }

    fn sample_asset() -> Asset {
        Asset {
            id: "r1".to_string(),
            geometry: Geometry::Point { lat: 25.0, lon: -80.0 },
            project_type: ProjectKind::Coastal,
            crop: None,
            financial_overrides: FinancialOverrides::default(),
            intervention: None,
            exposure: AssetExposure { asset_value_usd: 2_000_000.0, ..Default::default() },
            current_imperviousness: 0.60,
        }
    }

    #[test]
    fn time_travel_sweep_runs_in_year_ascending_order() {
        let asset = sample_asset();
        let scenario = Scenario {
            year: 2050,
            temp_delta: 3.0,
            rain_pct_change: -20.0,
            slr_projection_m: 1.2,
            rain_intensity_pct: 30.0,
            global_warming_c: 2.5,
        };
        let trajectory =
            run_time_travel_sweep(&asset, &scenario, &FallbackHazardProvider, 9).unwrap();
        let years: Vec<i32> = trajectory.samples.iter().map(|s| s.year).collect();
        assert_eq!(years, vec![2030, 2040, 2050]);
    }

    #[test]
    fn sector_percentiles_sum_weights_correctly() {
        let asset = sample_asset();
        let scenario = Scenario {
            year: 2050,
            temp_delta: 2.0,
            rain_pct_change: -10.0,
            slr_projection_m: 0.9,
            rain_intensity_pct: 20.0,
            global_warming_c: 2.0,
        };
        let hazard = FallbackHazardProvider.weather(25.0, -80.0, WeatherWindow::Annual);
        let reports: Vec<Report> = (0..3)
            .map(|i| crate::scenario_runner::run(&asset, &scenario, &hazard, i).unwrap())
            .collect();
        let percentiles = compute_sector_percentiles(&reports);
        assert_eq!(percentiles.len(), 3);
        for p in &percentiles {
            assert!((0.0..=100.0).contains(&p.composite_percentile));
        }
    }

    #[test]
    fn percentile_rank_excludes_self_from_the_peer_count() {
        // A 2-asset sector: the better value must score 50th percentile
        // (one strictly-worse peer out of two), not 100th.
        let values = [100.0, 50.0];
        assert_eq!(percentile_rank(&values, 100.0, true), 50.0);
        assert_eq!(percentile_rank(&values, 50.0, true), 0.0);
    }

    #[test]
    fn percentile_rank_single_value_uses_the_original_edge_case() {
        assert_eq!(percentile_rank(&[42.0], 42.0, true), 100.0);
        assert_eq!(percentile_rank(&[42.0], 42.0, false), 0.0);
    }

    #[test]
    fn sector_ranks_assign_one_to_the_best_npv() {
        let scenario = Scenario {
            year: 2050,
            temp_delta: 2.0,
            rain_pct_change: -10.0,
            slr_projection_m: 0.9,
            rain_intensity_pct: 20.0,
            global_warming_c: 2.0,
        };
        let hazard = FallbackHazardProvider.weather(25.0, -80.0, WeatherWindow::Annual);
        let mut asset = sample_asset();
        asset.project_type = ProjectKind::Agriculture;

        let reports: Vec<Report> = [2000.0, 500.0, 8000.0]
            .iter()
            .map(|&capex| {
                let mut a = asset.clone();
                a.financial_overrides.capex = Some(capex);
                crate::scenario_runner::run(&a, &scenario, &hazard, 1).unwrap()
            })
            .collect();

        let percentiles = compute_sector_percentiles(&reports);
        let best_idx = (0..reports.len())
            .max_by(|&a, &b| {
                reports[a]
                    .financial
                    .npv_usd
                    .partial_cmp(&reports[b].financial.npv_usd)
                    .unwrap()
            })
            .unwrap();
        assert_eq!(percentiles[best_idx].npv_rank, 1);
        let mut ranks: Vec<usize> = percentiles.iter().map(|p| p.npv_rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3]);
    }
}
