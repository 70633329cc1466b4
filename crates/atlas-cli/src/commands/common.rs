use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use atlas_core::hazard::{FallbackHazardProvider, HazardProvider, HazardSample, Provenance, WeatherWindow};
use atlas_core::scenario_runner::{Asset, Scenario};
use atlas_core::types::with_metadata;
use atlas_core::AtlasSettings;

use crate::input;

/// Shared request shape for the five per-project-kind subcommands: an
/// asset, the scenario it is evaluated under, and an optional seed for the
/// Monte-Carlo layer (defaults to `0` for reproducible runs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub asset: Asset,
    pub scenario: Scenario,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Read a [`ScenarioRequest`] from `--input <file>` or stdin.
pub fn read_scenario_request(input_path: &Option<String>) -> Result<ScenarioRequest, Box<dyn std::error::Error>> {
    if let Some(path) = input_path {
        Ok(input::file::read_json(path)?)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--input <file.json> or stdin required".into())
    }
}

/// Fetch the hazard sample at an asset's representative point via the
/// deterministic fallback provider (no live weather API in scope — spec.md
/// Non-goals).
pub fn fetch_hazard(asset: &Asset) -> HazardSample {
    let (lat, lon) = asset.geometry.representative_point();
    FallbackHazardProvider.weather(lat, lon, WeatherWindow::Annual)
}

/// A provenance warning (spec.md §7 `UPSTREAM_DEGRADED`) appended whenever a
/// [`HazardSample`] did not come from a live upstream provider. The only
/// shipped provider is the deterministic fallback, so every run carries one.
pub fn provenance_warning(hazard: &HazardSample) -> Vec<String> {
    match hazard.provenance {
        Provenance::Upstream => Vec::new(),
        Provenance::FallbackParametric | Provenance::FallbackClimateZone => vec![
            "hazard data is a deterministic parametric fallback; no live upstream provider is configured".to_string(),
        ],
    }
}

/// Wrap a command's result in the standard `ComputationOutput` envelope
/// (spec.md §7: every top-level report carries `status`), and merge a
/// `status: "success"` field into the serialized envelope so JSON consumers
/// can branch on it directly while the table/minimal formatters still find
/// `result`/`warnings`/`methodology` at their expected keys.
pub fn envelope<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    start: Instant,
    result: T,
) -> Value {
    let elapsed_us = start.elapsed().as_micros() as u64;
    let output = with_metadata(methodology, assumptions, warnings, elapsed_us, result);
    let mut value = serde_json::to_value(output).unwrap_or(Value::Null);
    if let Value::Object(ref mut map) = value {
        map.insert("status".to_string(), Value::String("success".to_string()));
    }
    value
}

/// A baseline scenario built from the process-wide [`AtlasSettings`], used
/// by commands (e.g. `batch` over a bare CSV) that have no scenario of
/// their own to deserialize.
pub fn default_scenario(settings: &AtlasSettings) -> Scenario {
    Scenario {
        year: settings.scenario_year,
        temp_delta: 2.0,
        rain_pct_change: -20.0,
        slr_projection_m: settings.slr_projection_m,
        rain_intensity_pct: settings.rain_intensity_increase_pct,
        global_warming_c: 2.0,
    }
}
