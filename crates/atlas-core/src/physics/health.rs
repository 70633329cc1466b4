//! Malaria suitability and public-health DALY monetization.

use serde::{Deserialize, Serialize};

/// Malaria suitability score `{0, 50, 100}`. Suitable when
/// `16 <= T <= 34` and rainfall `> 80mm`; 100 when comfortably inside the
/// band, 50 at the margins, else 0.
pub fn malaria_suitability_score(max_temp_celsius: f64, total_rain_mm: f64) -> u32 {
    let temp_suitable = (16.0..=34.0).contains(&max_temp_celsius);
    let rain_suitable = total_rain_mm > 80.0;
    if !temp_suitable || !rain_suitable {
        return 0;
    }
    let margin = 2.0;
    let comfortably_inside_temp =
        max_temp_celsius >= 16.0 + margin && max_temp_celsius <= 34.0 - margin;
    let comfortably_inside_rain = total_rain_mm > 80.0 + 20.0;
    if comfortably_inside_temp && comfortably_inside_rain {
        100
    } else {
        50
    }
}

/// Baseline DALYs-per-1000 attributable to heat stress, a monotone function
/// of WBGT productivity loss.
pub fn heat_dalys_per_1000(productivity_loss_fraction: f64) -> f64 {
    productivity_loss_fraction * 40.0
}

/// Baseline DALYs-per-1000 attributable to malaria suitability.
pub fn malaria_dalys_per_1000(malaria_risk_score: u32) -> f64 {
    (malaria_risk_score as f64 / 100.0) * 25.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DalyBreakdown {
    pub heat_dalys_per_1000_baseline: f64,
    pub malaria_dalys_per_1000_baseline: f64,
    pub total_dalys_per_1000_baseline: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DalyMonetization {
    pub gdp_per_capita_usd: f64,
    pub value_per_daly_usd: f64,
    pub economic_value_preserved_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DalyReport {
    pub baseline_dalys_lost: f64,
    pub post_intervention_dalys_lost: f64,
    pub dalys_averted: f64,
    pub breakdown: DalyBreakdown,
    pub monetization: DalyMonetization,
}

/// Interventions applied at the DALY layer: cooling centers cut the heat
/// component 40%; mosquito eradication cuts the malaria component 70%.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HealthInterventions {
    pub urban_cooling_center: bool,
    pub mosquito_eradication: bool,
}

impl HealthInterventions {
    /// Case-insensitive substring match from a free-text intervention name,
    /// matching the fuzzy-matching convention used elsewhere in this crate
    /// (`FloodIntervention::parse`, lifespan rescue strings).
    pub fn parse(name: &str) -> HealthInterventions {
        let lowered = name.to_lowercase();
        HealthInterventions {
            urban_cooling_center: lowered.contains("cooling"),
            mosquito_eradication: lowered.contains("mosquito") || lowered.contains("vector"),
        }
    }
}

/// Population-level DALYs-averted and economic value preserved.
pub fn calculate_daly_report(
    productivity_loss_fraction: f64,
    malaria_risk_score: u32,
    population: f64,
    gdp_per_capita_usd: f64,
    interventions: HealthInterventions,
) -> DalyReport {
    let heat_baseline = heat_dalys_per_1000(productivity_loss_fraction);
    let malaria_baseline = malaria_dalys_per_1000(malaria_risk_score);
    let total_baseline = heat_baseline + malaria_baseline;

    let heat_post = if interventions.urban_cooling_center {
        heat_baseline * 0.6
    } else {
        heat_baseline
    };
    let malaria_post = if interventions.mosquito_eradication {
        malaria_baseline * 0.3
    } else {
        malaria_baseline
    };
    let total_post = heat_post + malaria_post;

    let population_factor = population / 1000.0;
    let baseline_dalys_lost = total_baseline * population_factor;
    let post_intervention_dalys_lost = total_post * population_factor;
    let dalys_averted = (baseline_dalys_lost - post_intervention_dalys_lost).max(0.0);

    let value_per_daly_usd = 2.0 * gdp_per_capita_usd;
    let economic_value_preserved_usd = dalys_averted * value_per_daly_usd;

    DalyReport {
        baseline_dalys_lost,
        post_intervention_dalys_lost,
        dalys_averted,
        breakdown: DalyBreakdown {
            heat_dalys_per_1000_baseline: heat_baseline,
            malaria_dalys_per_1000_baseline: malaria_baseline,
            total_dalys_per_1000_baseline: total_baseline,
        },
        monetization: DalyMonetization {
            gdp_per_capita_usd,
            value_per_daly_usd,
            economic_value_preserved_usd,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malaria_unsuitable_outside_temp_band() {
        assert_eq!(malaria_suitability_score(10.0, 200.0), 0);
        assert_eq!(malaria_suitability_score(40.0, 200.0), 0);
    }

    #[test]
    fn malaria_unsuitable_without_rain() {
        assert_eq!(malaria_suitability_score(25.0, 50.0), 0);
    }

    #[test]
    fn malaria_fully_suitable_comfortably_inside_band() {
        assert_eq!(malaria_suitability_score(25.0, 200.0), 100);
    }

    #[test]
    fn malaria_marginal_at_band_edge() {
        assert_eq!(malaria_suitability_score(16.5, 90.0), 50);
    }

    #[test]
    fn daly_averted_nonnegative_and_monotone_in_interventions() {
        let baseline = calculate_daly_report(
            0.4,
            100,
            50_000.0,
            3_000.0,
            HealthInterventions::default(),
        );
        let with_cooling = calculate_daly_report(
            0.4,
            100,
            50_000.0,
            3_000.0,
            HealthInterventions {
                urban_cooling_center: true,
                mosquito_eradication: false,
            },
        );
        let with_both = calculate_daly_report(
            0.4,
            100,
            50_000.0,
            3_000.0,
            HealthInterventions {
                urban_cooling_center: true,
                mosquito_eradication: true,
            },
        );
        assert!(with_cooling.dalys_averted > 0.0);
        assert!(with_both.dalys_averted >= with_cooling.dalys_averted);
        assert_eq!(baseline.dalys_averted, 0.0);
    }

    #[test]
    fn value_per_daly_is_twice_gdp_per_capita() {
        let report =
            calculate_daly_report(0.3, 50, 10_000.0, 2_500.0, HealthInterventions::default());
        assert_eq!(report.monetization.value_per_daly_usd, 5_000.0);
    }

    #[test]
    fn parses_fuzzy_intervention_names() {
        let both = HealthInterventions::parse("urban cooling center + mosquito eradication");
        assert!(both.urban_cooling_center);
        assert!(both.mosquito_eradication);
        let vector_control = HealthInterventions::parse("vector control program");
        assert!(!vector_control.urban_cooling_center);
        assert!(vector_control.mosquito_eradication);
        let none = HealthInterventions::parse("none");
        assert!(!none.urban_cooling_center && !none.mosquito_eradication);
    }
}
