//! Urban flood depth. A regression surrogate maps (rain_intensity_mm_hr,
//! impervious_pct, slope_pct) to depth in centimetres; interventions reduce
//! effective imperviousness before the surrogate/fallback is consulted.
//! Depth is converted to a damage percent via the Huizinga depth-damage
//! curve.

use crate::physics::regressor::Regressor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tabulated imperviousness-reduction factor per intervention, from
/// `original_source/tests/test_flood_logic.py`'s `INTERVENTION_FACTORS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloodIntervention {
    GreenRoof,
    PermeablePavement,
    Bioswales,
    RainGardens,
    SpongeCity,
    None,
}

impl FloodIntervention {
    pub fn imperviousness_reduction_factor(self) -> f64 {
        match self {
            FloodIntervention::GreenRoof => 0.30,
            FloodIntervention::PermeablePavement => 0.40,
            FloodIntervention::Bioswales => 0.25,
            FloodIntervention::RainGardens => 0.20,
            FloodIntervention::SpongeCity => 0.35,
            FloodIntervention::None => 0.0,
        }
    }

    /// Case-insensitive, punctuation-tolerant parse from a free-text
    /// intervention name, matching the fuzzy-matching convention used
    /// elsewhere in this crate (column mapping, lifespan rescue strings).
    pub fn parse(name: &str) -> FloodIntervention {
        let lowered = name.to_lowercase();
        if lowered.contains("sponge") {
            FloodIntervention::SpongeCity
        } else if lowered.contains("green roof") || lowered.contains("green_roof") {
            FloodIntervention::GreenRoof
        } else if lowered.contains("permeable") {
            FloodIntervention::PermeablePavement
        } else if lowered.contains("bioswale") {
            FloodIntervention::Bioswales
        } else if lowered.contains("rain garden") || lowered.contains("rain_garden") {
            FloodIntervention::RainGardens
        } else {
            FloodIntervention::None
        }
    }
}

/// Effective imperviousness after an intervention is applied: a flat
/// subtraction of the intervention's reduction factor, both expressed as a
/// `0.0..=1.0` fraction (`current_impervious_pct:0.70` with `sponge_city`
/// gives `0.35`, not `0.455` — interventions remove a fixed share of
/// impervious surface, they don't scale down what's left).
pub fn apply_intervention(current_impervious_pct: f64, intervention: FloodIntervention) -> f64 {
    (current_impervious_pct - intervention.imperviousness_reduction_factor()).max(0.0)
}

/// Naive closed-form fallback depth estimate, consulted only when no
/// surrogate is configured: depth scales with rain intensity and
/// imperviousness, and is damped by slope (steeper sites drain faster).
fn fallback_depth_cm(rain_intensity_mm_hr: f64, impervious_pct: f64, slope_pct: f64) -> f64 {
    let drainage_damping = 1.0 / (1.0 + slope_pct / 10.0);
    (rain_intensity_mm_hr * 0.15 * impervious_pct * drainage_damping).max(0.0)
}

/// Flood depth in centimetres, via a loaded surrogate or the closed-form
/// fallback.
pub fn calculate_depth_cm(
    rain_intensity_mm_hr: f64,
    impervious_pct: f64,
    slope_pct: f64,
    surrogate: Option<&Arc<dyn Regressor>>,
) -> f64 {
    match surrogate {
        Some(model) => model
            .predict(&[rain_intensity_mm_hr, impervious_pct, slope_pct])
            .max(0.0),
        None => fallback_depth_cm(rain_intensity_mm_hr, impervious_pct, slope_pct),
    }
}

/// Huizinga depth-damage curve: piecewise-linear over breakpoints
/// `[0, 5, 15, 30, 60]`cm with damage percents `{0, 2, 8, 20, 40, 70}`
/// (70 is the ceiling beyond 60cm).
pub fn depth_damage_pct(depth_cm: f64) -> f64 {
    const BREAKPOINTS_CM: [f64; 5] = [0.0, 5.0, 15.0, 30.0, 60.0];
    const DAMAGE_PCT: [f64; 6] = [0.0, 2.0, 8.0, 20.0, 40.0, 70.0];

    if depth_cm <= BREAKPOINTS_CM[0] {
        return DAMAGE_PCT[0];
    }
    for i in 0..BREAKPOINTS_CM.len() - 1 {
        let (lo, hi) = (BREAKPOINTS_CM[i], BREAKPOINTS_CM[i + 1]);
        if depth_cm <= hi {
            let frac = (depth_cm - lo) / (hi - lo);
            return DAMAGE_PCT[i] + frac * (DAMAGE_PCT[i + 1] - DAMAGE_PCT[i]);
        }
    }
    DAMAGE_PCT[5]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sponge_city_reduces_imperviousness_by_35_pct() {
        let reduced = apply_intervention(0.70, FloodIntervention::SpongeCity);
        assert!((reduced - 0.35).abs() < 1e-9);
    }

    #[test]
    fn none_intervention_is_a_no_op() {
        assert_eq!(apply_intervention(0.70, FloodIntervention::None), 0.70);
    }

    #[test]
    fn depth_damage_zero_at_zero_depth() {
        assert_eq!(depth_damage_pct(0.0), 0.0);
    }

    #[test]
    fn depth_damage_interpolates_between_breakpoints() {
        // Midpoint of [5,15] -> midpoint of [2,8] = 5.0
        assert!((depth_damage_pct(10.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn depth_damage_caps_at_70_beyond_60cm() {
        assert_eq!(depth_damage_pct(60.0), 70.0);
        assert_eq!(depth_damage_pct(200.0), 70.0);
    }

    #[test]
    fn parses_fuzzy_intervention_names() {
        assert_eq!(FloodIntervention::parse("Sponge City"), FloodIntervention::SpongeCity);
        assert_eq!(
            FloodIntervention::parse("Permeable Pavement"),
            FloodIntervention::PermeablePavement
        );
        assert_eq!(FloodIntervention::parse("unknown thing"), FloodIntervention::None);
    }

    #[test]
    fn sponge_city_depth_lower_than_baseline() {
        let baseline_impervious = 0.70;
        let baseline_depth = calculate_depth_cm(100.0, baseline_impervious, 2.0, None);
        let intervention_impervious =
            apply_intervention(baseline_impervious, FloodIntervention::SpongeCity);
        let intervention_depth = calculate_depth_cm(100.0, intervention_impervious, 2.0, None);
        assert!(intervention_depth < baseline_depth);
    }
}
