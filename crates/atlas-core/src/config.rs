use serde::{Deserialize, Serialize};

/// Immutable settings record constructed once at process start. No component
/// inside this crate reads `std::env` directly — per the design note that
/// killed the original source's global mutable config/env-var reads, the CLI
/// binary is the only place these variables are read, and everything else
/// receives this struct as a plain argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasSettings {
    pub use_mock_data: bool,
    pub scenario_year: i32,
    pub slr_projection_m: f64,
    pub rain_intensity_increase_pct: f64,
    pub financial: FinancialOverrides,
    pub max_workers: usize,
    pub scenario_runner_deadline_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialOverrides {
    pub capex: Option<f64>,
    pub opex: Option<f64>,
    pub discount_rate: Option<f64>,
    pub years: Option<u32>,
}

impl Default for AtlasSettings {
    fn default() -> Self {
        AtlasSettings {
            use_mock_data: true,
            scenario_year: 2050,
            slr_projection_m: 1.0,
            rain_intensity_increase_pct: 25.0,
            financial: FinancialOverrides::default(),
            max_workers: 8,
            scenario_runner_deadline_ms: 30_000,
        }
    }
}

impl AtlasSettings {
    /// Build from the enumerated environment variables. Intended to be
    /// called exactly once, by `atlas-cli`'s `main`.
    pub fn from_env() -> Self {
        let mut settings = AtlasSettings::default();
        if let Ok(v) = std::env::var("ATLAS_USE_MOCK_DATA") {
            settings.use_mock_data = v != "0" && !v.eq_ignore_ascii_case("false");
        }
        if let Ok(v) = std::env::var("ATLAS_SCENARIO_YEAR") {
            if let Ok(year) = v.parse() {
                settings.scenario_year = year;
            }
        }
        if let Ok(v) = std::env::var("ATLAS_SLR_PROJECTION_M") {
            if let Ok(slr) = v.parse() {
                settings.slr_projection_m = slr;
            }
        }
        if let Ok(v) = std::env::var("ATLAS_RAIN_INTENSITY_INCREASE_PCT") {
            if let Ok(pct) = v.parse() {
                settings.rain_intensity_increase_pct = pct;
            }
        }
        if let Ok(v) = std::env::var("FINANCIAL_CAPEX") {
            settings.financial.capex = v.parse().ok();
        }
        if let Ok(v) = std::env::var("FINANCIAL_OPEX") {
            settings.financial.opex = v.parse().ok();
        }
        if let Ok(v) = std::env::var("FINANCIAL_DISCOUNT_RATE") {
            settings.financial.discount_rate = v.parse().ok();
        }
        if let Ok(v) = std::env::var("FINANCIAL_YEARS") {
            settings.financial.years = v.parse().ok();
        }
        settings
    }
}
