//! Standard normal density, distribution function and quantile.
//!
//! Thin wrappers over `statrs` that pin down the behaviour at `±∞`, which the
//! integrator relies on for unbounded regions:
//!
//! - `pdf(±∞) = 0`
//! - `cdf(-∞) = 0`, `cdf(+∞) = 1`
//! - `quantile(0) = -∞`, `quantile(1) = +∞`

use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Standard normal density `φ(z)`.
pub fn pdf(z: f64) -> f64 {
    if z.is_infinite() {
        return 0.0;
    }
    Normal::standard().pdf(z)
}

/// Standard normal distribution function `Φ(z)`.
pub fn cdf(z: f64) -> f64 {
    if z == f64::INFINITY {
        return 1.0;
    }
    if z == f64::NEG_INFINITY {
        return 0.0;
    }
    Normal::standard().cdf(z)
}

/// Standard normal quantile `Φ⁻¹(p)` (R's `qnorm`).
///
/// Returns NaN outside `[0, 1]`.
pub fn quantile(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    Normal::standard().inverse_cdf(p)
}

/// Probability mass of the standard normal on `[lo, hi]`.
///
/// Uses the upper tail when both endpoints are positive so that mass far in
/// the right tail is not lost to cancellation.
pub fn interval_mass(lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    if lo > 0.0 {
        (cdf(-lo) - cdf(-hi)).max(0.0)
    } else {
        (cdf(hi) - cdf(lo)).max(0.0)
    }
}
