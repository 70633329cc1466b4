//! Scenario Runner: the pure per-asset pipeline Hazard -> Physics ->
//! Lifespan -> Financial -> Monte-Carlo -> Damage (spec.md §4.7). Dispatch
//! on `ProjectKind` is a static, exhaustive match — no trait-object kernel
//! dispatch (spec.md §9's design note).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::AtlasError;
use crate::financial::{self, AgricultureCashFlowInputs, FinancialResult};
use crate::hazard::HazardSample;
use crate::lifespan::{self, LifespanAdjustment, LifespanHazard};
use crate::monte_carlo::npv_uncertainty::{
    self, DriverDistribution, DriverDistributions, MonteCarloResult,
};
use crate::physics::agriculture::{Crop, SeedType};
use crate::physics::health::DalyReport;
use crate::physics::{agriculture, coastal, flash_flood, flood, heat};
use crate::spatial::{self, IntensityDriver, Polygon, RiskType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectKind {
    Agriculture,
    Coastal,
    UrbanFlood,
    FlashFlood,
    Health,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Geometry {
    Point { lat: f64, lon: f64 },
    Polygon(JsonValue),
}

impl Geometry {
    pub fn representative_point(&self) -> (f64, f64) {
        match self {
            Geometry::Point { lat, lon } => (*lat, *lon),
            Geometry::Polygon(geojson) => {
                let parsed = spatial::parse_geojson(geojson).expect("validated at asset construction");
                let c = spatial::centroid(&parsed);
                (c.lat, c.lon)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialOverrides {
    pub capex: Option<f64>,
    pub opex: Option<f64>,
    pub discount_rate: Option<f64>,
    pub lifespan_years: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetExposure {
    pub asset_value_usd: f64,
    pub daily_revenue_usd: f64,
    pub workforce_size: f64,
    pub daily_wage_usd: f64,
    pub population: f64,
    pub gdp_per_capita_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub geometry: Geometry,
    pub project_type: ProjectKind,
    pub crop: Option<Crop>,
    pub financial_overrides: FinancialOverrides,
    pub intervention: Option<String>,
    pub exposure: AssetExposure,
    /// Baseline impervious-surface fraction (`0.0..=1.0`), consulted by
    /// `ProjectKind::UrbanFlood` before `flood::apply_intervention`.
    #[serde(default = "default_current_imperviousness")]
    pub current_imperviousness: f64,
}

fn default_current_imperviousness() -> f64 {
    0.60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub year: i32,
    pub temp_delta: f64,
    pub rain_pct_change: f64,
    pub slr_projection_m: f64,
    pub rain_intensity_pct: f64,
    pub global_warming_c: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsResult {
    pub yield_pct: Option<f64>,
    pub runup_m: Option<f64>,
    pub depth_cm: Option<f64>,
    pub flood_area_km2: Option<f64>,
    pub productivity_loss_pct: Option<f64>,
    pub malaria_risk_score: Option<u32>,
    pub damage_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub asset_id: String,
    pub project_type: ProjectKind,
    pub scenario_year: i32,
    pub physics: PhysicsResult,
    pub lifespan: Option<LifespanAdjustment>,
    pub opex_penalty_fraction: Option<f64>,
    pub financial: FinancialResult,
    pub monte_carlo: MonteCarloResult,
    pub exposure_fraction: f64,
    pub value_at_risk_usd: f64,
    pub protected_value_usd: f64,
    pub daly: Option<DalyReport>,
}

fn normalize_hazard(hazard: &HazardSample, scenario: &Scenario) -> HazardSample {
    let mut normalized = hazard.clone();
    normalized.max_temp_celsius += scenario.temp_delta;
    normalized.total_rain_mm *= 1.0 + scenario.rain_pct_change / 100.0;
    normalized
}

fn driver_distributions(_asset: &Asset, scenario: &Scenario) -> DriverDistributions {
    DriverDistributions {
        temp_delta: DriverDistribution {
            mean: scenario.temp_delta,
            std_dev: (scenario.temp_delta.abs() * 0.15).max(0.2),
        },
        rain_pct_change: DriverDistribution {
            mean: scenario.rain_pct_change,
            std_dev: (scenario.rain_pct_change.abs() * 0.2).max(2.0),
        },
        slr_projection_m: DriverDistribution {
            mean: scenario.slr_projection_m,
            std_dev: (scenario.slr_projection_m.abs() * 0.15).max(0.05),
        },
        rain_intensity_pct: DriverDistribution {
            mean: scenario.rain_intensity_pct,
            std_dev: (scenario.rain_intensity_pct.abs() * 0.2).max(2.0),
        },
    }
}

fn agriculture_pipeline(
    asset: &Asset,
    hazard: &HazardSample,
    overrides: &FinancialOverrides,
) -> (PhysicsResult, FinancialResult) {
    let crop = asset.crop.unwrap_or(Crop::Maize);
    let standard_yield_pct = agriculture::calculate_yield_pct(
        crop,
        hazard.max_temp_celsius,
        hazard.total_rain_mm,
        Some(hazard.soil_ph),
        SeedType::Standard,
    );
    let resilient_yield_pct = agriculture::calculate_yield_pct(
        crop,
        hazard.max_temp_celsius,
        hazard.total_rain_mm,
        Some(hazard.soil_ph),
        SeedType::Resilient,
    );
    let damage_pct = (100.0 - standard_yield_pct).max(0.0);

    let mut cf_inputs = AgricultureCashFlowInputs::default();
    if let Some(capex) = overrides.capex {
        cf_inputs.capex = capex;
    }
    if let Some(opex) = overrides.opex {
        cf_inputs.opex = opex;
    }
    if let Some(rate) = overrides.discount_rate {
        cf_inputs.discount_rate = rate;
    }
    cf_inputs.standard_yield_tons_per_ha = standard_yield_pct / 100.0 * cf_inputs.standard_yield_tons_per_ha;
    cf_inputs.resilient_yield_tons_per_ha =
        resilient_yield_pct / 100.0 * cf_inputs.resilient_yield_tons_per_ha;

    let flows = financial::agriculture_cash_flows(&cf_inputs);
    let financial_result = financial::evaluate_cash_flows(&flows, cf_inputs.discount_rate, &cf_inputs);

    (
        PhysicsResult {
            yield_pct: Some(standard_yield_pct),
            runup_m: None,
            depth_cm: None,
            flood_area_km2: None,
            productivity_loss_pct: None,
            malaria_risk_score: None,
            damage_pct,
        },
        financial_result,
    )
}

fn coastal_pipeline(
    asset: &Asset,
    hazard: &HazardSample,
    scenario: &Scenario,
    overrides: &FinancialOverrides,
) -> (PhysicsResult, FinancialResult, LifespanAdjustment, f64) {
    let runup_m = coastal::calculate_runup_m(hazard.max_wave_height_m, hazard.slope_pct, 0.0, None);
    let damage_pct = (runup_m * 20.0).min(100.0);

    let initial_years = overrides.lifespan_years.unwrap_or(30.0);
    let adjustment = lifespan::apply_lifespan_depreciation(
        LifespanHazard::Coastal,
        initial_years,
        scenario.slr_projection_m,
        asset.intervention.as_deref(),
    );
    let opex_penalty = lifespan::opex_climate_penalty_fraction(
        LifespanHazard::Coastal,
        scenario.slr_projection_m,
        asset.intervention.as_deref(),
    );

    let capex = overrides.capex.unwrap_or(asset.exposure.asset_value_usd * 0.1);
    let opex = overrides.opex.unwrap_or(asset.exposure.asset_value_usd * 0.01);
    let discount_rate = overrides.discount_rate.unwrap_or(0.08);
    let avoided_damage_usd = asset.exposure.asset_value_usd * damage_pct / 100.0;
    let years = adjustment.adjusted_years.round() as u32;
    let mut flows = vec![-capex];
    for _ in 1..=years.max(1) {
        flows.push(avoided_damage_usd / years.max(1) as f64 - opex * (1.0 + opex_penalty));
    }
    let financial_result = financial::evaluate_cash_flows(&flows, discount_rate, &adjustment);

    (
        PhysicsResult {
            yield_pct: None,
            runup_m: Some(runup_m),
            depth_cm: None,
            flood_area_km2: None,
            productivity_loss_pct: None,
            malaria_risk_score: None,
            damage_pct,
        },
        financial_result,
        adjustment,
        opex_penalty,
    )
}

fn urban_flood_pipeline(
    asset: &Asset,
    hazard: &HazardSample,
    scenario: &Scenario,
    overrides: &FinancialOverrides,
) -> (PhysicsResult, FinancialResult, LifespanAdjustment, f64) {
    let intervention = asset
        .intervention
        .as_deref()
        .map(flood::FloodIntervention::parse)
        .unwrap_or(flood::FloodIntervention::None);
    let baseline_impervious_pct = asset.current_imperviousness;
    let effective_impervious_pct = flood::apply_intervention(baseline_impervious_pct, intervention);
    let depth_cm = flood::calculate_depth_cm(
        scenario.rain_intensity_pct,
        effective_impervious_pct,
        hazard.slope_pct,
        None,
    );
    let damage_pct = flood::depth_damage_pct(depth_cm);

    let adjustment = lifespan::apply_lifespan_depreciation(
        LifespanHazard::Flood,
        overrides.lifespan_years.unwrap_or(25.0),
        scenario.global_warming_c,
        asset.intervention.as_deref(),
    );
    let opex_penalty = lifespan::opex_climate_penalty_fraction(
        LifespanHazard::Flood,
        scenario.global_warming_c,
        asset.intervention.as_deref(),
    );

    let capex = overrides.capex.unwrap_or(asset.exposure.asset_value_usd * 0.05);
    let opex = overrides.opex.unwrap_or(asset.exposure.asset_value_usd * 0.01);
    let discount_rate = overrides.discount_rate.unwrap_or(0.08);
    let avoided_loss_usd = asset.exposure.asset_value_usd * damage_pct / 100.0;
    let years = adjustment.adjusted_years.round() as u32;
    let mut flows = vec![-capex];
    for _ in 1..=years.max(1) {
        flows.push(avoided_loss_usd / years.max(1) as f64 - opex * (1.0 + opex_penalty));
    }
    let financial_result = financial::evaluate_cash_flows(&flows, discount_rate, &adjustment);

    (
        PhysicsResult {
            yield_pct: None,
            runup_m: None,
            depth_cm: Some(depth_cm),
            flood_area_km2: None,
            productivity_loss_pct: None,
            malaria_risk_score: None,
            damage_pct,
        },
        financial_result,
        adjustment,
        opex_penalty,
    )
}

fn flash_flood_pipeline(
    asset: &Asset,
    scenario: &Scenario,
    overrides: &FinancialOverrides,
) -> (PhysicsResult, FinancialResult) {
    let (lat, lon) = asset.geometry.representative_point();
    let area_km2 = flash_flood::flooded_area_km2(lat, lon, scenario.rain_intensity_pct);
    let baseline_area = flash_flood::baseline_area_km2(lat, lon);
    let damage_pct = ((area_km2 / baseline_area - 1.0) * 100.0).clamp(0.0, 100.0);

    let capex = overrides.capex.unwrap_or(asset.exposure.asset_value_usd * 0.03);
    let discount_rate = overrides.discount_rate.unwrap_or(0.08);
    let avoided_loss_usd = asset.exposure.asset_value_usd * damage_pct / 100.0;
    let flows = vec![-capex, avoided_loss_usd, avoided_loss_usd, avoided_loss_usd];
    let financial_result = financial::evaluate_cash_flows(&flows, discount_rate, &area_km2);

    (
        PhysicsResult {
            yield_pct: None,
            runup_m: None,
            depth_cm: None,
            flood_area_km2: Some(area_km2),
            productivity_loss_pct: None,
            malaria_risk_score: None,
            damage_pct,
        },
        financial_result,
    )
}

fn health_pipeline(
    asset: &Asset,
    hazard: &HazardSample,
    overrides: &FinancialOverrides,
) -> (PhysicsResult, FinancialResult, DalyReport) {
    let wbgt = heat::wbgt(hazard.max_temp_celsius, hazard.humidity_pct);
    let productivity_loss = heat::productivity_loss_fraction(wbgt);
    let productivity_loss_pct = productivity_loss * 100.0;
    let malaria_score =
        crate::physics::health::malaria_suitability_score(hazard.max_temp_celsius, hazard.total_rain_mm);

    let daily_loss_usd = asset.exposure.workforce_size * asset.exposure.daily_wage_usd * productivity_loss;
    let annual_loss_usd = daily_loss_usd * 250.0;
    let capex = overrides.capex.unwrap_or(annual_loss_usd * 0.5);
    let discount_rate = overrides.discount_rate.unwrap_or(0.06);
    let flows = vec![-capex, annual_loss_usd, annual_loss_usd, annual_loss_usd, annual_loss_usd, annual_loss_usd];
    let financial_result = financial::evaluate_cash_flows(&flows, discount_rate, &productivity_loss_pct);

    let interventions = asset
        .intervention
        .as_deref()
        .map(crate::physics::health::HealthInterventions::parse)
        .unwrap_or_default();
    let daly = crate::physics::health::calculate_daly_report(
        productivity_loss,
        malaria_score,
        asset.exposure.population,
        asset.exposure.gdp_per_capita_usd,
        interventions,
    );

    (
        PhysicsResult {
            yield_pct: None,
            runup_m: None,
            depth_cm: None,
            flood_area_km2: None,
            productivity_loss_pct: Some(productivity_loss_pct),
            malaria_risk_score: Some(malaria_score),
            damage_pct: productivity_loss_pct,
        },
        financial_result,
        daly,
    )
}

/// Run the full per-asset pipeline: Hazard -> Physics -> Lifespan ->
/// Financial -> Monte-Carlo -> spatial scaling -> Report. Deterministic
/// under a fixed `(asset, scenario, hazard, seed)` (R1).
pub fn run(
    asset: &Asset,
    scenario: &Scenario,
    hazard: &HazardSample,
    seed: u64,
) -> Result<Report, AtlasError> {
    let normalized = normalize_hazard(hazard, scenario);
    let overrides = asset.financial_overrides.clone();

    let (physics, financial_result, lifespan_adj, opex_penalty, daly) = match asset.project_type {
        ProjectKind::Agriculture => {
            let (p, f) = agriculture_pipeline(asset, &normalized, &overrides);
            (p, f, None, None, None)
        }
        ProjectKind::Coastal => {
            let (p, f, l, o) = coastal_pipeline(asset, &normalized, scenario, &overrides);
            (p, f, Some(l), Some(o), None)
        }
        ProjectKind::UrbanFlood => {
            let (p, f, l, o) = urban_flood_pipeline(asset, &normalized, scenario, &overrides);
            (p, f, Some(l), Some(o), None)
        }
        ProjectKind::FlashFlood => {
            let (p, f) = flash_flood_pipeline(asset, scenario, &overrides);
            (p, f, None, None, None)
        }
        ProjectKind::Health => {
            let (p, f, d) = health_pipeline(asset, &normalized, &overrides);
            (p, f, None, None, Some(d))
        }
    };

    let token = crate::cancellation::CancellationToken::new();
    let distributions = driver_distributions(asset, scenario);
    let base_cash_flows = financial_result.incremental_cash_flow.clone();
    let discount_rate = overrides
        .discount_rate
        .unwrap_or_else(|| estimate_discount_rate(asset.project_type));

    let monte_carlo = npv_uncertainty::run_npv_uncertainty(
        &distributions,
        2000,
        seed,
        &token,
        |draw| {
            let sensitivity = 1.0
                + (draw.temp_delta - scenario.temp_delta) * 0.02
                + (draw.rain_pct_change - scenario.rain_pct_change) * 0.002
                + (draw.slr_projection_m - scenario.slr_projection_m) * 0.05
                + (draw.rain_intensity_pct - scenario.rain_intensity_pct) * 0.002;
            let perturbed: Vec<f64> = base_cash_flows
                .iter()
                .enumerate()
                .map(|(t, cf)| if t == 0 { *cf } else { cf * sensitivity })
                .collect();
            financial::npv(&perturbed, discount_rate)
        },
    )?;

    let (lat, lon) = asset.geometry.representative_point();
    let risk_type = match asset.project_type {
        ProjectKind::Agriculture => RiskType::Agriculture,
        ProjectKind::Coastal => RiskType::Coastal,
        ProjectKind::UrbanFlood | ProjectKind::FlashFlood => RiskType::Flood,
        ProjectKind::Health => RiskType::Heat,
    };
    let intensity = match asset.project_type {
        ProjectKind::Coastal => IntensityDriver::SlrM(scenario.slr_projection_m),
        ProjectKind::UrbanFlood | ProjectKind::FlashFlood => {
            IntensityDriver::FloodDepthM(physics.depth_cm.unwrap_or(0.0) / 100.0)
        }
        _ => IntensityDriver::TempDeltaC(scenario.temp_delta),
    };

    let (exposure_fraction, value_at_risk_usd, protected_value_usd) = match &asset.geometry {
        Geometry::Polygon(geojson) => {
            let polygon: Polygon = spatial::parse_geojson(geojson)?;
            let area = spatial::area_km2(&polygon);
            let centroid = spatial::centroid(&polygon);
            let exposure = spatial::fractional_exposure(centroid, area, risk_type, intensity);
            let scaling = spatial::scale_monetary_risk(
                asset.exposure.asset_value_usd,
                exposure,
                physics.damage_pct / 100.0,
                area,
            );
            (exposure, scaling.value_at_risk_usd, scaling.protected_value_usd)
        }
        Geometry::Point { .. } => {
            let exposure = spatial::fractional_exposure(
                spatial::LonLat { lon, lat },
                0.0,
                risk_type,
                intensity,
            );
            let exposed_value = asset.exposure.asset_value_usd * exposure;
            let value_at_risk = exposed_value * physics.damage_pct / 100.0;
            (exposure, value_at_risk, asset.exposure.asset_value_usd - exposed_value)
        }
    };

    Ok(Report {
        asset_id: asset.id.clone(),
        project_type: asset.project_type,
        scenario_year: scenario.year,
        physics,
        lifespan: lifespan_adj,
        opex_penalty_fraction: opex_penalty,
        financial: financial_result,
        monte_carlo,
        exposure_fraction,
        value_at_risk_usd,
        protected_value_usd,
        daly,
    })
}

fn estimate_discount_rate(project_type: ProjectKind) -> f64 {
    match project_type {
        ProjectKind::Agriculture => 0.10,
        ProjectKind::Coastal | ProjectKind::UrbanFlood => 0.08,
        ProjectKind::FlashFlood => 0.08,
        ProjectKind::Health => 0.06,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::{FallbackHazardProvider, HazardProvider, WeatherWindow};

    fn sample_asset(project_type: ProjectKind) -> Asset {
        Asset {
            id: "asset-1".to_string(),
            geometry: Geometry::Point { lat: 35.0, lon: -97.0 },
            project_type,
            crop: Some(Crop::Maize),
            financial_overrides: FinancialOverrides::default(),
            intervention: None,
            exposure: AssetExposure {
                asset_value_usd: 1_000_000.0,
                daily_revenue_usd: 5_000.0,
                workforce_size: 50.0,
                daily_wage_usd: 25.0,
                population: 10_000.0,
                gdp_per_capita_usd: 8_000.0,
            },
            current_imperviousness: 0.60,
        }
    }

    fn sample_scenario() -> Scenario {
        Scenario {
            year: 2050,
            temp_delta: 3.0,
            rain_pct_change: -30.0,
            slr_projection_m: 1.0,
            rain_intensity_pct: 25.0,
            global_warming_c: 2.0,
        }
    }

    #[test]
    fn r1_deterministic_under_fixed_seed() {
        let asset = sample_asset(ProjectKind::Agriculture);
        let scenario = sample_scenario();
        let hazard = FallbackHazardProvider.weather(35.0, -97.0, WeatherWindow::Annual);

        let a = run(&asset, &scenario, &hazard, 42).unwrap();
        let b = run(&asset, &scenario, &hazard, 42).unwrap();
        assert_eq!(a.financial.npv_usd, b.financial.npv_usd);
        assert_eq!(a.monte_carlo.mean_npv, b.monte_carlo.mean_npv);
        assert_eq!(a.physics.damage_pct, b.physics.damage_pct);
    }

    #[test]
    fn runs_every_project_kind_without_error() {
        let scenario = sample_scenario();
        let hazard = FallbackHazardProvider.weather(25.7617, -80.1918, WeatherWindow::Annual);
        for kind in [
            ProjectKind::Agriculture,
            ProjectKind::Coastal,
            ProjectKind::UrbanFlood,
            ProjectKind::FlashFlood,
            ProjectKind::Health,
        ] {
            let asset = sample_asset(kind);
            let report = run(&asset, &scenario, &hazard, 1).unwrap();
            assert_eq!(report.project_type, kind);
            assert!(report.exposure_fraction > 0.0);
        }
    }

    #[test]
    fn health_pipeline_populates_daly_report() {
        let scenario = sample_scenario();
        let hazard = FallbackHazardProvider.weather(25.7617, -80.1918, WeatherWindow::Annual);
        let mut asset = sample_asset(ProjectKind::Health);
        asset.intervention = Some("urban cooling center".to_string());
        let report = run(&asset, &scenario, &hazard, 1).unwrap();

        let daly = report.daly.expect("health reports carry a DALY breakdown");
        assert!(daly.dalys_averted >= 0.0);
        assert!(daly.monetization.economic_value_preserved_usd >= 0.0);
        assert!(daly.post_intervention_dalys_lost <= daly.baseline_dalys_lost);

        for kind in [
            ProjectKind::Agriculture,
            ProjectKind::Coastal,
            ProjectKind::UrbanFlood,
            ProjectKind::FlashFlood,
        ] {
            let other = sample_asset(kind);
            let report = run(&other, &scenario, &hazard, 1).unwrap();
            assert!(report.daly.is_none());
        }
    }

    #[test]
    fn polygon_asset_uses_spatial_scaling() {
        let mut asset = sample_asset(ProjectKind::UrbanFlood);
        asset.geometry = Geometry::Polygon(serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[0.0,0.0],[0.01,0.0],[0.01,0.01],[0.0,0.01],[0.0,0.0]]]
        }));
        let scenario = sample_scenario();
        let hazard = FallbackHazardProvider.weather(0.0, 0.0, WeatherWindow::Annual);
        let report = run(&asset, &scenario, &hazard, 5).unwrap();
        assert!((0.05..=0.95).contains(&report.exposure_fraction));
        assert!(report.value_at_risk_usd <= asset.exposure.asset_value_usd);
    }
}
