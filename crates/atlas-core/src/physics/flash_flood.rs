//! Flash-flood footprint. A dynamic topographic-wetness-index threshold
//! gates how much of a location-seeded baseline urban area floods as rain
//! intensity increases.

use crate::hazard::location_seed;

/// Dynamic TWI threshold: `T = 12 * (1 - intensity_pct * 0.07 / 100)`.
pub fn twi_threshold(rain_intensity_pct: f64) -> f64 {
    12.0 * (1.0 - rain_intensity_pct * 0.07 / 100.0)
}

/// Location-seeded baseline footprint in `[50, 150]` km², derived the same
/// way the Spatial Engine derives its deterministic location seed.
pub fn baseline_area_km2(lat: f64, lon: f64) -> f64 {
    let seed = location_seed(lat, lon);
    50.0 + (seed as f64 / 100.0) * 100.0
}

/// Flooded urban area in km², growing ~2% per 1% rain-intensity increase
/// over the location-seeded baseline.
pub fn flooded_area_km2(lat: f64, lon: f64, rain_intensity_pct: f64) -> f64 {
    let baseline = baseline_area_km2(lat, lon);
    let growth_factor = 1.0 + rain_intensity_pct * 0.02;
    baseline * growth_factor
}
