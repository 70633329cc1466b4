//! HazardProvider: weather, terrain, coastal, monthly climatology, and
//! land-cover samples for a coordinate. A real upstream (satellite imagery,
//! Earth Engine, a weather API) is a thin external collaborator out of this
//! crate's scope; the one concrete implementation here is the deterministic
//! parametric fallback every provider call degrades to when upstream is
//! unavailable.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How a [`HazardSample`] field was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Upstream,
    FallbackParametric,
    FallbackClimateZone,
}

/// The averaging window requested from `weather`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherWindow {
    Monthly,
    Annual,
}

/// A hazard sample for one coordinate, fully provenance-tagged. Fetched at
/// the start of a Scenario Runner invocation and discarded at the end — it
/// is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardSample {
    pub max_temp_celsius: f64,
    pub total_rain_mm: f64,
    pub humidity_pct: f64,
    pub elevation_m: f64,
    pub soil_ph: f64,
    pub slope_pct: f64,
    pub max_wave_height_m: f64,
    pub monthly_rainfall_mm: [f64; 12],
    pub monthly_soil_moisture_pct: [f64; 12],
    pub ndvi_series: [f64; 12],
    pub provenance: Provenance,
}

/// Humidity is never observed directly; it is derived from total rainfall.
pub fn derive_humidity_pct(total_rain_mm: f64) -> f64 {
    if total_rain_mm < 500.0 {
        50.0
    } else if total_rain_mm < 1000.0 {
        65.0
    } else {
        80.0
    }
}

/// Climate-zone parametric fallback keyed on absolute latitude.
fn climate_zone_baseline(lat: f64) -> (f64, f64) {
    let abs_lat = lat.abs();
    if abs_lat < 23.5 {
        (28.5, 1800.0) // tropical
    } else if abs_lat < 35.0 {
        (25.0, 900.0) // subtropical
    } else if abs_lat < 50.0 {
        (20.0, 700.0) // temperate
    } else {
        (15.0, 500.0) // cold
    }
}

/// Deterministic location seed shared by the flash-flood footprint kernel
/// and the Spatial Engine's fractional-exposure mock — both need a stable
/// per-coordinate pseudo-random baseline without an RNG dependency.
pub fn location_seed(lat: f64, lon: f64) -> i64 {
    ((lat.abs() * 100.0 + lon.abs() * 100.0) as i64) % 100
}

/// Returns weather, terrain, coastal and NDVI samples for a coordinate. The
/// core never branches on transport failures — there is no failure mode
/// visible here; everything resolves to a tagged sample.
pub trait HazardProvider: Send + Sync {
    fn weather(&self, lat: f64, lon: f64, window: WeatherWindow) -> HazardSample;
}

/// The one shipped [`HazardProvider`]: deterministic climate-zone fallback.
/// Selected by `AtlasSettings::use_mock_data` (default `true`), since real
/// upstream ingestion is explicitly out of scope.
pub struct FallbackHazardProvider;

impl HazardProvider for FallbackHazardProvider {
    fn weather(&self, lat: f64, lon: f64, _window: WeatherWindow) -> HazardSample {
        warn!(lat, lon, "no upstream weather provider configured; using climate-zone fallback");
        let (max_temp_celsius, total_rain_mm) = climate_zone_baseline(lat);
        let humidity_pct = derive_humidity_pct(total_rain_mm);
        let seed = location_seed(lat, lon);

        let mut monthly_rainfall_mm = [0.0; 12];
        let mut monthly_soil_moisture_pct = [0.0; 12];
        let mut ndvi_series = [0.0; 12];
        for month in 0..12 {
            let seasonal = (std::f64::consts::PI * (month as f64 / 6.0)).sin();
            monthly_rainfall_mm[month] = (total_rain_mm / 12.0) * (1.0 + 0.3 * seasonal);
            monthly_soil_moisture_pct[month] = (30.0 + 10.0 * seasonal
                + (seed % 10) as f64)
                .clamp(0.0, 100.0);
            ndvi_series[month] = (0.3 + 0.4 * seasonal.abs()).clamp(-1.0, 1.0);
        }

        HazardSample {
            max_temp_celsius,
            total_rain_mm,
            humidity_pct,
            elevation_m: 10.0 + (seed as f64),
            soil_ph: 6.5,
            slope_pct: 2.0 + (seed % 10) as f64 * 0.5,
            max_wave_height_m: 1.0 + (seed % 5) as f64 * 0.2,
            monthly_rainfall_mm,
            monthly_soil_moisture_pct,
            ndvi_series,
            provenance: Provenance::FallbackClimateZone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tropical_baseline_matches_spec() {
        let (t, r) = climate_zone_baseline(10.0);
        assert_eq!(t, 28.5);
        assert_eq!(r, 1800.0);
    }

    #[test]
    fn cold_baseline_matches_spec() {
        let (t, r) = climate_zone_baseline(60.0);
        assert_eq!(t, 15.0);
        assert_eq!(r, 500.0);
    }

    #[test]
    fn humidity_thresholds() {
        assert_eq!(derive_humidity_pct(400.0), 50.0);
        assert_eq!(derive_humidity_pct(900.0), 65.0);
        assert_eq!(derive_humidity_pct(1500.0), 80.0);
    }

    #[test]
    fn fallback_tags_provenance() {
        let provider = FallbackHazardProvider;
        let sample = provider.weather(35.0, -97.0, WeatherWindow::Annual);
        assert_eq!(sample.provenance, Provenance::FallbackClimateZone);
        assert_eq!(sample.monthly_rainfall_mm.len(), 12);
    }

    #[test]
    fn same_coordinate_is_deterministic() {
        let provider = FallbackHazardProvider;
        let a = provider.weather(25.7617, -80.1918, WeatherWindow::Annual);
        let b = provider.weather(25.7617, -80.1918, WeatherWindow::Annual);
        assert_eq!(a.max_temp_celsius, b.max_temp_celsius);
        assert_eq!(a.monthly_rainfall_mm, b.monthly_rainfall_mm);
    }
}
