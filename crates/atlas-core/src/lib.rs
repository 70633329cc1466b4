//! atlas-core: the climate-resilience risk simulation and rating engine.
//!
//! Physics kernels, the financial kernel, the Monte-Carlo harness, the
//! spatial engine, the per-asset Scenario Runner, the batch orchestrator,
//! and the rating/outlook/portfolio post-processing layer. Transport (HTTP),
//! auth, CSV-upload parsing, satellite enrichment, and NLG narration are
//! deliberately not implemented here — see `SPEC_FULL.md` §1.

pub mod cancellation;
pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "hazard")]
pub mod hazard;

#[cfg(feature = "physics")]
pub mod physics;

#[cfg(feature = "price_shock")]
pub mod price_shock;

#[cfg(feature = "lifespan")]
pub mod lifespan;

#[cfg(feature = "financial")]
pub mod financial;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

#[cfg(feature = "spatial")]
pub mod spatial;

#[cfg(feature = "scenario_runner")]
pub mod scenario_runner;

#[cfg(feature = "orchestrator")]
pub mod orchestrator;

#[cfg(feature = "rating")]
pub mod rating;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use config::AtlasSettings;
pub use error::{AtlasError, AtlasResult};
pub use types::*;
