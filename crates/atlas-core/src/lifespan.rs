//! Lifespan depreciation and OPEX climate-penalty degradation
//! (spec.md §4.3). Only the coastal and flood/urban-flood tables are
//! implemented as explicit lifespan kernels — agriculture stress shows up
//! as yield loss (Physics Kernel), not years-of-life lost, resolving the
//! Open Question in spec.md §9 about a third lifespan table.

use serde::{Deserialize, Serialize};

/// Fraction of the raw penalty retained once a rescue intervention applies
/// (an 80% reduction): `adjusted_penalty = raw_penalty * 0.2`.
pub const LIFESPAN_RESCUE_FRACTION: f64 = 0.2;

/// OPEX rescue retains only 15% of the unrescued penalty (an 85%
/// reduction) — a distinct rescue fraction from the lifespan rescue's 20%
/// retention.
pub const OPEX_RESCUE_FRACTION: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifespanHazard {
    Coastal,
    Flood,
}

/// Case-insensitive substring match for a rescue intervention: "sea wall"/
/// "seawall" rescues coastal assets, "sponge" (city) rescues flood assets.
pub fn is_rescue_intervention(hazard: LifespanHazard, intervention: Option<&str>) -> bool {
    let Some(text) = intervention else {
        return false;
    };
    let lowered = text.to_lowercase();
    match hazard {
        LifespanHazard::Coastal => lowered.contains("sea wall") || lowered.contains("seawall"),
        LifespanHazard::Flood => lowered.contains("sponge"),
    }
}

fn coastal_raw_penalty_years(slr_m: f64) -> f64 {
    if slr_m >= 1.0 {
        12.0
    } else if slr_m >= 0.5 {
        5.0
    } else {
        0.0
    }
}

fn flood_raw_penalty_years(warming_delta_c: f64) -> f64 {
    if warming_delta_c >= 2.0 {
        10.0
    } else if warming_delta_c >= 1.5 {
        4.0
    } else {
        0.0
    }
}

fn coastal_opex_penalty_pct(slr_m: f64) -> f64 {
    if slr_m >= 1.0 {
        30.0
    } else if slr_m >= 0.5 {
        15.0
    } else {
        0.0
    }
}

fn flood_opex_penalty_pct(warming_delta_c: f64) -> f64 {
    if warming_delta_c >= 2.0 {
        25.0
    } else if warming_delta_c >= 1.5 {
        12.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifespanAdjustment {
    pub initial_years: f64,
    pub raw_penalty_years: f64,
    pub rescue_applied: bool,
    pub penalty_years: f64,
    pub adjusted_years: f64,
}

/// Apply lifespan depreciation for a hazard driver magnitude (SLR metres
/// for coastal, warming delta for flood). `adjusted_years >= 1` always (P2).
pub fn apply_lifespan_depreciation(
    hazard: LifespanHazard,
    initial_years: f64,
    driver_magnitude: f64,
    intervention: Option<&str>,
) -> LifespanAdjustment {
    let raw_penalty_years = match hazard {
        LifespanHazard::Coastal => coastal_raw_penalty_years(driver_magnitude),
        LifespanHazard::Flood => flood_raw_penalty_years(driver_magnitude),
    };
    let rescue_applied = is_rescue_intervention(hazard, intervention);
    let penalty_years = if rescue_applied {
        raw_penalty_years * LIFESPAN_RESCUE_FRACTION
    } else {
        raw_penalty_years
    };
    let adjusted_years = (initial_years - penalty_years).max(1.0);

    LifespanAdjustment {
        initial_years,
        raw_penalty_years,
        rescue_applied,
        penalty_years,
        adjusted_years,
    }
}

/// OPEX climate penalty as a fraction of base annual OPEX (not a percent —
/// internal convention is fractions per Invariant 4).
pub fn opex_climate_penalty_fraction(
    hazard: LifespanHazard,
    driver_magnitude: f64,
    intervention: Option<&str>,
) -> f64 {
    let raw_pct = match hazard {
        LifespanHazard::Coastal => coastal_opex_penalty_pct(driver_magnitude),
        LifespanHazard::Flood => flood_opex_penalty_pct(driver_magnitude),
    };
    let rescue_applied = is_rescue_intervention(hazard, intervention);
    let pct = if rescue_applied {
        raw_pct * OPEX_RESCUE_FRACTION
    } else {
        raw_pct
    };
    pct / 100.0
}
