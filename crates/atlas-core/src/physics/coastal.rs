//! Coastal run-up. A regression surrogate maps (wave_height, slope,
//! mangrove_width_m) to run-up metres; absent a surrogate, the Stockdon
//! fallback is used.

use crate::physics::regressor::Regressor;
use std::sync::Arc;

/// `R = 0.71 * slope * H * (1 - 0.45)^(width/100)`.
pub fn stockdon_runup_m(wave_height_m: f64, slope_pct: f64, mangrove_width_m: f64) -> f64 {
    let slope_fraction = slope_pct / 100.0;
    0.71 * slope_fraction * wave_height_m * (1.0 - 0.45_f64).powf(mangrove_width_m / 100.0)
}

/// Run-up elevation in metres. Uses a loaded surrogate when present, else
/// the Stockdon closed form.
pub fn calculate_runup_m(
    wave_height_m: f64,
    slope_pct: f64,
    mangrove_width_m: f64,
    surrogate: Option<&Arc<dyn Regressor>>,
) -> f64 {
    match surrogate {
        Some(model) => model.predict(&[wave_height_m, slope_pct, mangrove_width_m]),
        None => stockdon_runup_m(wave_height_m, slope_pct, mangrove_width_m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runup_without_mangroves_is_positive_for_positive_waves() {
        let r = stockdon_runup_m(2.0, 3.0, 0.0);
        assert!(r > 0.0);
    }

    #[test]
    fn wider_mangroves_attenuate_runup() {
        let bare = stockdon_runup_m(2.0, 3.0, 0.0);
        let protected = stockdon_runup_m(2.0, 3.0, 200.0);
        assert!(protected < bare);
    }

    #[test]
    fn falls_back_without_surrogate() {
        let r = calculate_runup_m(2.0, 3.0, 0.0, None);
        assert_eq!(r, stockdon_runup_m(2.0, 3.0, 0.0));
    }
}
