//! Attenuation of a correlation when one variable is discretized.
//!
//! Responsibilities:
//!
//! - integrate the per-category partial moments (parallel, one task per category)
//! - combine them with the label moments into an attenuation factor
//! - provide the dichotomous closed form used as a consistency check

pub mod calculator;

pub use calculator::*;
