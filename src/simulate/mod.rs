//! Monte Carlo verification of the analytic attenuation factor.
//!
//! Draws correlated normal pairs, discretizes the latent coordinate with a
//! `CategoryScheme` and measures the correlations directly.

pub mod monte_carlo;

pub use monte_carlo::*;
