//! Crop yield physics. Only maize and cocoa carry full temperature/rainfall
//! yield curves — the only two crops the original source models physics
//! for (confirmed against its `test_multi_crop_physics.py`); other catalog
//! crops in [`crate::price_shock`] are price-shock-only.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedType {
    Standard,
    Resilient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crop {
    Maize,
    Cocoa,
}

/// `f` clipped to `[0, 1]`.
fn clip01(f: f64) -> f64 {
    f.clamp(0.0, 1.0)
}

/// Triangular suitability factor: 1.0 at `optimum`, falling linearly to 0.0
/// at the domain edges `low`/`high`.
fn triangular_factor(value: f64, low: f64, optimum: f64, high: f64) -> f64 {
    if value <= low || value >= high {
        return 0.0;
    }
    if value <= optimum {
        clip01((value - low) / (optimum - low))
    } else {
        clip01((high - value) / (high - optimum))
    }
}

fn maize_factors(max_temp_c: f64, total_rain_mm: f64, soil_ph: Option<f64>, seed: SeedType) -> f64 {
    let critical_temp = match seed {
        SeedType::Standard => 28.0,
        SeedType::Resilient => 31.0, // resilient seed tolerates +3C
    };
    let temp_factor = if max_temp_c <= critical_temp {
        1.0
    } else {
        clip01(1.0 - (max_temp_c - critical_temp) / 10.0)
    };

    let drought_floor = match seed {
        SeedType::Standard => 500.0,
        SeedType::Resilient => 350.0, // shifted drought threshold downward
    };
    let rain_factor = if total_rain_mm < drought_floor {
        clip01(total_rain_mm / drought_floor)
    } else if total_rain_mm <= 1300.0 {
        1.0
    } else {
        // waterlogging above 1300mm
        clip01(1.0 - (total_rain_mm - 1300.0) / 1000.0)
    };

    let ph_factor = soil_ph.map(|ph| triangular_factor(ph, 4.5, 6.5, 8.5)).unwrap_or(1.0);

    temp_factor * rain_factor * ph_factor
}

fn cocoa_factors(max_temp_c: f64, total_rain_mm: f64, soil_ph: Option<f64>, seed: SeedType) -> f64 {
    let heat_limit = match seed {
        SeedType::Standard => 33.0,
        SeedType::Resilient => 36.0,
    };
    let temp_factor = if max_temp_c <= heat_limit {
        1.0
    } else {
        clip01(1.0 - (max_temp_c - heat_limit) / 8.0)
    };

    let min_rain = match seed {
        SeedType::Standard => 1200.0,
        SeedType::Resilient => 900.0,
    };
    let rain_factor = if total_rain_mm < min_rain {
        clip01(total_rain_mm / min_rain)
    } else if total_rain_mm <= 1750.0 {
        1.0
    } else {
        clip01(1.0 - (total_rain_mm - 1750.0) / 1500.0)
    };

    let ph_factor = soil_ph.map(|ph| triangular_factor(ph, 4.5, 6.0, 7.5)).unwrap_or(1.0);

    temp_factor * rain_factor * ph_factor
}

/// Yield as a percent in `[0, 100]` (P1). Product of independent
/// temperature, rainfall, and optional soil-pH factors, each clipped to
/// `[0, 1]`.
pub fn calculate_yield_pct(
    crop: Crop,
    max_temp_c: f64,
    total_rain_mm: f64,
    soil_ph: Option<f64>,
    seed: SeedType,
) -> f64 {
    let combined = match crop {
        Crop::Maize => maize_factors(max_temp_c, total_rain_mm, soil_ph, seed),
        Crop::Cocoa => cocoa_factors(max_temp_c, total_rain_mm, soil_ph, seed),
    };
    clip01(combined) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yield_is_always_in_domain() {
        for temp in [-10.0, 0.0, 20.0, 28.0, 40.0, 60.0] {
            for rain in [0.0, 500.0, 800.0, 1300.0, 2000.0] {
                for seed in [SeedType::Standard, SeedType::Resilient] {
                    let y = calculate_yield_pct(Crop::Maize, temp, rain, None, seed);
                    assert!((0.0..=100.0).contains(&y), "maize yield out of range: {y}");
                    let y = calculate_yield_pct(Crop::Cocoa, temp, rain, None, seed);
                    assert!((0.0..=100.0).contains(&y), "cocoa yield out of range: {y}");
                }
            }
        }
    }

    #[test]
    fn maize_optimum_is_full_yield() {
        let y = calculate_yield_pct(Crop::Maize, 25.0, 800.0, None, SeedType::Standard);
        assert_eq!(y, 100.0);
    }

    #[test]
    fn cocoa_optimum_is_full_yield() {
        let y = calculate_yield_pct(Crop::Cocoa, 25.0, 1750.0, None, SeedType::Standard);
        assert_eq!(y, 100.0);
    }

    #[test]
    fn no_stress_gives_zero_resilient_vs_standard_delta_at_optimum() {
        // P3: at the physics optimum, resilient-vs-standard delta is 0.
        let standard = calculate_yield_pct(Crop::Maize, 25.0, 800.0, None, SeedType::Standard);
        let resilient = calculate_yield_pct(Crop::Maize, 25.0, 800.0, None, SeedType::Resilient);
        assert_eq!(standard, resilient);
    }

    #[test]
    fn resilient_outperforms_standard_under_heat_stress() {
        let standard = calculate_yield_pct(Crop::Maize, 33.0, 800.0, None, SeedType::Standard);
        let resilient = calculate_yield_pct(Crop::Maize, 33.0, 800.0, None, SeedType::Resilient);
        assert!(resilient >= standard);
    }

    #[test]
    fn resilient_outperforms_standard_under_drought() {
        let standard = calculate_yield_pct(Crop::Maize, 25.0, 400.0, None, SeedType::Standard);
        let resilient = calculate_yield_pct(Crop::Maize, 25.0, 400.0, None, SeedType::Resilient);
        assert!(resilient >= standard);
    }

    #[test]
    fn cocoa_resilient_outperforms_standard_under_heat() {
        let standard = calculate_yield_pct(Crop::Cocoa, 35.0, 1750.0, None, SeedType::Standard);
        let resilient = calculate_yield_pct(Crop::Cocoa, 35.0, 1750.0, None, SeedType::Resilient);
        assert!(resilient >= standard);
    }
}
