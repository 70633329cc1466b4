use serde::{Deserialize, Serialize};

/// All monetary values. Plain `f64` throughout — see DESIGN.md for why this
/// system does not use `Decimal`: the core is stochastic and physics-numeric,
/// and the external contract calls for IEEE double precision, not exact
/// ledger arithmetic.
pub type Money = f64;

/// Rates and fractions (0.05 = 5%). Never a bare integer percentage.
pub type Rate = f64;

/// Year fractions or counts.
pub type Years = f64;

/// Standard computation output envelope: every report-producing operation
/// returns one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata carried by every computation. `computation_time_us` is wall-clock
/// and explicitly excluded from any determinism/equality comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a computation result with metadata. The one envelope constructor
/// used crate-wide (generalizes the teacher's `with_metadata_f64`).
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
