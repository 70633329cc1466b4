//! Price-Shock Engine: supply-elasticity-based commodity price response and
//! revenue-impact calculator (spec.md component #11).

use crate::error::AtlasError;
use serde::{Deserialize, Serialize};

/// `(baseline_price_usd_per_ton, supply_elasticity)` per commodity, recovered
/// from `original_source/tests/test_price_shock_engine.py`.
fn catalog_lookup(crop: &str) -> Option<(f64, f64)> {
    let canonical = canonicalize(crop);
    match canonical.as_str() {
        "maize" => Some((180.0, 0.25)),
        "wheat" => Some((220.0, 0.30)),
        "soybeans" => Some((450.0, 0.35)),
        "cocoa" => Some((2500.0, 0.15)),
        "rice" => Some((450.0, 0.20)),
        "potato" => Some((350.0, 0.60)),
        _ => None,
    }
}

fn canonicalize(crop: &str) -> String {
    match crop.trim().to_lowercase().as_str() {
        "corn" => "maize".to_string(),
        "soy" => "soybeans".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceShockReport {
    pub crop: String,
    pub baseline_price_usd_per_ton: f64,
    pub shocked_price_usd_per_ton: f64,
    pub price_change_pct: f64,
    pub price_change_abs_usd: f64,
    pub elasticity: f64,
    pub yield_loss_pct: f64,
    pub baseline_yield_tons: f64,
    pub stressed_yield_tons: f64,
    pub revenue_baseline_usd: f64,
    pub revenue_stressed_usd: f64,
    pub revenue_impact_usd: f64,
    pub recommendation: String,
}

fn recommendation_for(yield_loss_pct: f64) -> &'static str {
    if yield_loss_pct < 5.0 {
        "LOW RISK"
    } else if yield_loss_pct < 15.0 {
        "MODERATE"
    } else if yield_loss_pct < 30.0 {
        "HIGH RISK"
    } else {
        "URGENT"
    }
}

/// Compute a price-shock report for a known crop. `baseline_yield_tons`
/// must be `> 0`; `stressed_yield_tons` must be `>= 0`; unknown crops are
/// rejected with `InvalidInput`.
pub fn calculate_price_shock(
    crop: &str,
    baseline_yield_tons: f64,
    stressed_yield_tons: f64,
) -> Result<PriceShockReport, AtlasError> {
    if baseline_yield_tons <= 0.0 {
        return Err(AtlasError::invalid(
            "baseline_yield_tons",
            "must be greater than zero",
        ));
    }
    if stressed_yield_tons < 0.0 {
        return Err(AtlasError::invalid(
            "stressed_yield_tons",
            "must be non-negative",
        ));
    }
    let (baseline_price, elasticity) = catalog_lookup(crop).ok_or_else(|| AtlasError::invalid(
        "crop",
        format!("unknown crop '{crop}' — not in the price-shock catalog"),
    ))?;

    let yield_loss_pct =
        ((baseline_yield_tons - stressed_yield_tons) / baseline_yield_tons * 100.0).max(0.0);
    let price_change_pct = yield_loss_pct / elasticity;
    let shocked_price = baseline_price * (1.0 + price_change_pct / 100.0);
    let price_change_abs = shocked_price - baseline_price;

    let revenue_baseline = baseline_yield_tons * baseline_price;
    let revenue_stressed = stressed_yield_tons * shocked_price;
    let revenue_impact = revenue_stressed - revenue_baseline;

    Ok(PriceShockReport {
        crop: canonicalize(crop),
        baseline_price_usd_per_ton: baseline_price,
        shocked_price_usd_per_ton: shocked_price,
        price_change_pct,
        price_change_abs_usd: price_change_abs,
        elasticity,
        yield_loss_pct,
        baseline_yield_tons,
        stressed_yield_tons,
        revenue_baseline_usd: revenue_baseline,
        revenue_stressed_usd: revenue_stressed,
        revenue_impact_usd: revenue_impact,
        recommendation: recommendation_for(yield_loss_pct).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scenario_matches_spec_example() {
        // crop=maize, baseline 1000t, stressed 700t, baseline_price=180, elasticity=0.25
        let report = calculate_price_shock("maize", 1000.0, 700.0).unwrap();
        assert!((report.price_change_pct - 120.0).abs() < 1e-9);
        assert!((report.shocked_price_usd_per_ton - 396.0).abs() < 1e-9);
        assert_eq!(report.recommendation, "URGENT");
    }

    #[test]
    fn zero_yield_loss_keeps_baseline_price() {
        let report = calculate_price_shock("maize", 1000.0, 1000.0).unwrap();
        assert!((report.shocked_price_usd_per_ton - report.baseline_price_usd_per_ton).abs() < 1e-9);
        assert_eq!(report.recommendation, "LOW RISK");
    }

    #[test]
    fn unknown_crop_is_invalid_input() {
        let err = calculate_price_shock("unobtainium", 100.0, 50.0).unwrap_err();
        assert_eq!(err.kind(), "INVALID_INPUT");
    }

    #[test]
    fn aliases_resolve_case_insensitively() {
        let corn = calculate_price_shock("CORN", 100.0, 90.0).unwrap();
        let maize = calculate_price_shock("maize", 100.0, 90.0).unwrap();
        assert_eq!(corn.baseline_price_usd_per_ton, maize.baseline_price_usd_per_ton);
        assert_eq!(corn.crop, "maize");
    }

    #[test]
    fn price_times_elasticity_recovers_yield_loss() {
        // P6: %price * elasticity ≈ %yield_loss up to rounding.
        let report = calculate_price_shock("wheat", 800.0, 600.0).unwrap();
        let recovered = report.price_change_pct * report.elasticity;
        assert!((recovered - report.yield_loss_pct).abs() < 1e-9);
    }

    #[test]
    fn recommendation_bands() {
        assert_eq!(recommendation_for(2.0), "LOW RISK");
        assert_eq!(recommendation_for(10.0), "MODERATE");
        assert_eq!(recommendation_for(20.0), "HIGH RISK");
        assert_eq!(recommendation_for(40.0), "URGENT");
    }

    #[test]
    fn negative_baseline_yield_rejected() {
        assert!(calculate_price_shock("maize", 0.0, 10.0).is_err());
    }
}
