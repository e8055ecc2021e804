//! Bivariate normal partial moments over rectangular regions.
//!
//! Responsibilities:
//!
//! - validate distribution parameters and regions before integrating
//! - compute `∫∫ x^a y^b f(x, y) dx dy` over a rectangle (`a, b ∈ {0, 1}`)
//! - offer a fast conditional strategy and a fully iterated 2-D strategy

pub mod bivariate;

pub use bivariate::*;
