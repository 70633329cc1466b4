//! Heat/WBGT workforce productivity loss.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatStressCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

/// `WBGT = 0.7*T + 0.1*H`, where `H` is the rainfall-derived humidity
/// percent in `[0, 100]` (confirmed against
/// `original_source/tests/test_health_engine.py`: `30*0.7 + 60*0.1 = 27`).
pub fn wbgt(max_temp_celsius: f64, humidity_pct: f64) -> f64 {
    0.7 * max_temp_celsius + 0.1 * humidity_pct
}

/// Productivity loss as a fraction in `[0, 0.5]`: 0 below 26C WBGT, rising
/// linearly to 50% at 32C, capped beyond.
pub fn productivity_loss_fraction(wbgt_c: f64) -> f64 {
    if wbgt_c <= 26.0 {
        0.0
    } else if wbgt_c >= 32.0 {
        0.5
    } else {
        0.5 * (wbgt_c - 26.0) / 6.0
    }
}

/// Quintile split of `[26, 32]`C WBGT into display categories.
pub fn category(wbgt_c: f64) -> HeatStressCategory {
    if wbgt_c < 26.0 {
        HeatStressCategory::Low
    } else if wbgt_c < 27.2 {
        HeatStressCategory::Moderate
    } else if wbgt_c < 28.4 {
        HeatStressCategory::High
    } else if wbgt_c < 29.6 {
        HeatStressCategory::VeryHigh
    } else {
        HeatStressCategory::Extreme
    }
}
