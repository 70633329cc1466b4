//! Physics Kernels: closed-form or surrogate-backed functions translating a
//! hazard sample into a physical damage or productivity signal. Every
//! kernel is a deterministic pure function — no I/O, no `Result` except
//! where the original spec explicitly calls for one (the price-shock crop
//! lookup, handled in [`crate::price_shock`]).

pub mod agriculture;
pub mod coastal;
pub mod flash_flood;
pub mod flood;
pub mod health;
pub mod heat;
pub mod regressor;
