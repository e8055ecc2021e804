//! `attenuation` library crate.
//!
//! Computes how much the correlation between a continuous variable `X` and a
//! latent normal `Y*` shrinks when `Y*` is only observed through ordered
//! categories. The binary (`attenuate`) is a thin wrapper around this library so that:
//!
//! - the integrator and calculator are testable without spawning processes
//! - the Monte Carlo check reuses exactly the same category schemes

pub mod app;
pub mod attenuation;
pub mod cli;
pub mod domain;
pub mod error;
pub mod integrate;
pub mod io;
pub mod math;
pub mod report;
pub mod simulate;

pub use attenuation::{compute_attenuation, compute_attenuation_raw, compute_attenuation_with};
pub use domain::{AttenuationResult, BivariateNormalParams, CategoryScheme, QuadratureConfig, Region};
pub use error::AttenuationError;
pub use integrate::{Moment, integrate_bivariate_tail, partial_moment};
pub use simulate::simulate_attenuation;
