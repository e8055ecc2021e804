//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - distribution parameters and integration regions (`BivariateNormalParams`, `Region`)
//! - category schemes for discretizing a latent variable (`CategoryScheme`)
//! - configuration and result types (`QuadratureConfig`, `SimulationConfig`, `AttenuationResult`)

pub mod types;

pub use types::*;
