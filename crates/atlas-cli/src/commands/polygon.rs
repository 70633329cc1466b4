use std::time::Instant;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atlas_core::spatial::{self, IntensityDriver, RiskType};

use super::common::envelope;
use crate::input;

#[derive(Args)]
pub struct PolygonArgs {
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct PolygonRequest {
    geojson: Value,
    risk_type: RiskType,
    /// Exactly one of these must be set, matching `risk_type`.
    flood_depth_m: Option<f64>,
    slr_m: Option<f64>,
    temp_delta_c: Option<f64>,
    asset_value_usd: f64,
    damage_factor: f64,
}

fn intensity_driver(request: &PolygonRequest) -> Result<IntensityDriver, Box<dyn std::error::Error>> {
    if let Some(depth) = request.flood_depth_m {
        Ok(IntensityDriver::FloodDepthM(depth))
    } else if let Some(slr) = request.slr_m {
        Ok(IntensityDriver::SlrM(slr))
    } else if let Some(delta) = request.temp_delta_c {
        Ok(IntensityDriver::TempDeltaC(delta))
    } else {
        Err("one of flood_depth_m, slr_m, or temp_delta_c is required".into())
    }
}

/// Standalone spatial exposure and monetary scaling for a GeoJSON polygon,
/// independent of the full per-asset Scenario Runner pipeline.
pub fn run_polygon(args: PolygonArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: PolygonRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required".into());
    };

    let intensity = intensity_driver(&request)?;
    let polygon = spatial::parse_geojson(&request.geojson)?;
    let area_km2 = spatial::area_km2(&polygon);
    let centroid = spatial::centroid(&polygon);
    let exposure_fraction = spatial::fractional_exposure(centroid, area_km2, request.risk_type, intensity);
    let scaling = spatial::scale_monetary_risk(
        request.asset_value_usd,
        exposure_fraction,
        request.damage_factor,
        area_km2,
    );
    Ok(envelope(
        "geodesic Shoelace area + deterministic fractional exposure -> monetary scaling",
        &request,
        Vec::new(),
        start,
        scaling,
    ))
}
