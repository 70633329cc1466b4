//! Surrogate regressors: opaque, pre-fitted models the core loads and
//! queries. Training them is out of scope (Non-goal); kernels depend only on
//! this trait, never on a concrete loader, per the design note in
//! SPEC_FULL.md §9.

/// A black-box regressor: feature vector in, prediction out. Implementations
/// must be safe to share across the worker pool (read-only after load).
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> f64;
}

/// A fixed-weight linear regressor, the simplest concrete `Regressor`. Real
/// tree-ensemble loaders would implement the same trait; this crate ships
/// none, so every Physics Kernel that would consult a regressor falls back
/// to its closed-form formula when no `Arc<dyn Regressor>` is configured.
pub struct LinearRegressor {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl Regressor for LinearRegressor {
    fn predict(&self, features: &[f64]) -> f64 {
        let dot: f64 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, f)| w * f)
            .sum();
        dot + self.intercept
    }
}
