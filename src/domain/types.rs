//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed explicitly between the integrator, the calculator and the simulator
//! - exported to JSON/CSV
//! - printed in comparison tables

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AttenuationError;
use crate::math::normal;

/// Parameters of a bivariate normal distribution for `(X, Y*)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BivariateNormalParams {
    pub mean_x: f64,
    pub mean_y: f64,
    pub sd_x: f64,
    pub sd_y: f64,
    pub rho: f64,
}

impl BivariateNormalParams {
    /// Standardized margins with correlation `rho`.
    pub fn standard(rho: f64) -> Self {
        Self {
            mean_x: 0.0,
            mean_y: 0.0,
            sd_x: 1.0,
            sd_y: 1.0,
            rho,
        }
    }

    /// Reject degenerate parameters before any numerical work is attempted.
    pub fn validate(&self) -> Result<(), AttenuationError> {
        let all_finite = [self.mean_x, self.mean_y, self.sd_x, self.sd_y, self.rho]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(AttenuationError::InvalidParameters(format!(
                "all parameters must be finite: {self:?}"
            )));
        }
        if self.sd_x <= 0.0 || self.sd_y <= 0.0 {
            return Err(AttenuationError::InvalidParameters(format!(
                "standard deviations must be > 0 (sd_x={}, sd_y={})",
                self.sd_x, self.sd_y
            )));
        }
        if self.rho.abs() >= 1.0 {
            return Err(AttenuationError::InvalidParameters(format!(
                "correlation must lie strictly inside (-1, 1), got {}",
                self.rho
            )));
        }
        Ok(())
    }

    /// Conditional standard deviation of standardized `X` given `Y*`: `sqrt(1 - ρ²)`.
    pub fn residual_sd(&self) -> f64 {
        (1.0 - self.rho * self.rho).sqrt()
    }
}

/// A closed interval on the real line; either endpoint may be infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// `(-∞, ∞)`.
    pub fn full() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn validate(&self, axis: &str) -> Result<(), AttenuationError> {
        if self.lo.is_nan() || self.hi.is_nan() {
            return Err(AttenuationError::InvalidParameters(format!(
                "{axis} interval has a NaN endpoint"
            )));
        }
        if self.lo > self.hi {
            return Err(AttenuationError::InvalidParameters(format!(
                "{axis} interval is reversed: lo={}, hi={}",
                self.lo, self.hi
            )));
        }
        Ok(())
    }

    /// Apply `z = (v - mean) / sd` to both endpoints (infinities are preserved).
    pub fn standardize(&self, mean: f64, sd: f64) -> Self {
        Self::new((self.lo - mean) / sd, (self.hi - mean) / sd)
    }
}

/// Rectangular integration region `x ∈ [lo_x, hi_x]`, `y ∈ [lo_y, hi_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: Interval,
    pub y: Interval,
}

impl Region {
    pub fn new(x: Interval, y: Interval) -> Self {
        Self { x, y }
    }

    /// The whole plane.
    pub fn full() -> Self {
        Self::new(Interval::full(), Interval::full())
    }

    /// All of `x`, with `y` restricted to `[lo, hi]` (a category band).
    pub fn y_band(lo: f64, hi: f64) -> Self {
        Self::new(Interval::full(), Interval::new(lo, hi))
    }

    pub fn validate(&self) -> Result<(), AttenuationError> {
        self.x.validate("x")?;
        self.y.validate("y")
    }
}

/// Which integration strategy the bivariate integrator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Closed-form inner integral over `x | y`, adaptive quadrature over `y`.
    #[default]
    Conditional,
    /// Adaptive quadrature over both axes (nested Gauss–Kronrod).
    Iterated,
}

/// Quadrature tolerances and evaluation budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadratureConfig {
    pub abs_tol: f64,
    pub rel_tol: f64,
    /// Maximum number of integrand evaluations for one 2-D integral.
    pub max_evals: usize,
    pub strategy: Strategy,
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            abs_tol: 1e-10,
            rel_tol: 1e-7,
            max_evals: 2_000_000,
            strategy: Strategy::Conditional,
        }
    }
}

impl QuadratureConfig {
    pub fn validate(&self) -> Result<(), AttenuationError> {
        if !(self.abs_tol.is_finite() && self.abs_tol >= 0.0) {
            return Err(AttenuationError::InvalidConfig(format!(
                "absolute tolerance must be finite and >= 0, got {}",
                self.abs_tol
            )));
        }
        if !(self.rel_tol.is_finite() && self.rel_tol >= 0.0) {
            return Err(AttenuationError::InvalidConfig(format!(
                "relative tolerance must be finite and >= 0, got {}",
                self.rel_tol
            )));
        }
        if self.abs_tol == 0.0 && self.rel_tol == 0.0 {
            return Err(AttenuationError::InvalidConfig(
                "at least one of abs_tol / rel_tol must be > 0".to_string(),
            ));
        }
        if self.max_evals == 0 {
            return Err(AttenuationError::InvalidConfig("max_evals must be > 0".to_string()));
        }
        Ok(())
    }
}

/// An ordered discretization of a standardized latent variable.
///
/// `k - 1` thresholds `τ_1 < … < τ_{k-1}` split the line into `k` categories;
/// category `i` covers `[τ_i, τ_{i+1})` with `τ_0 = -∞`, `τ_k = +∞`, and is
/// observed as `labels[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScheme {
    thresholds: Vec<f64>,
    labels: Vec<f64>,
    probabilities: Vec<f64>,
}

impl CategoryScheme {
    /// Build a scheme from thresholds already in z-score units.
    ///
    /// Thresholds may be infinite (a category may be empty) but must be
    /// strictly increasing.
    pub fn new(thresholds: Vec<f64>, labels: Vec<f64>) -> Result<Self, AttenuationError> {
        if thresholds.is_empty() {
            return Err(AttenuationError::InvalidScheme(
                "at least one threshold (two categories) is required".to_string(),
            ));
        }
        if labels.len() != thresholds.len() + 1 {
            return Err(AttenuationError::InvalidScheme(format!(
                "expected {} labels for {} thresholds, got {}",
                thresholds.len() + 1,
                thresholds.len(),
                labels.len()
            )));
        }
        if thresholds.iter().any(|t| t.is_nan()) {
            return Err(AttenuationError::InvalidScheme("thresholds must not be NaN".to_string()));
        }
        if labels.iter().any(|l| !l.is_finite()) {
            return Err(AttenuationError::InvalidScheme("labels must be finite".to_string()));
        }
        if let Some(w) = thresholds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(AttenuationError::InvalidScheme(format!(
                "thresholds must be strictly increasing ({} >= {})",
                w[0], w[1]
            )));
        }

        let probabilities = (0..=thresholds.len())
            .map(|i| {
                let (lo, hi) = bounds_of(&thresholds, i);
                normal::interval_mass(lo, hi)
            })
            .collect();

        Ok(Self {
            thresholds,
            labels,
            probabilities,
        })
    }

    /// Build a scheme from thresholds in the raw units of a latent variable
    /// with the given mean and standard deviation.
    pub fn from_raw(
        thresholds: &[f64],
        labels: Vec<f64>,
        mean: f64,
        sd: f64,
    ) -> Result<Self, AttenuationError> {
        let z = standardize_thresholds(thresholds, mean, sd)?;
        Self::new(z, labels)
    }

    /// Build a scheme from cumulative cut probabilities (`thresholds = qnorm(p)`).
    pub fn from_cumulative_probs(probs: &[f64], labels: Vec<f64>) -> Result<Self, AttenuationError> {
        if let Some(p) = probs.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(AttenuationError::InvalidScheme(format!(
                "cumulative probabilities must lie in [0, 1], got {p}"
            )));
        }
        Self::new(probs.iter().map(|&p| normal::quantile(p)).collect(), labels)
    }

    /// Labels `0, 1, …, k-1` for `k - 1` thresholds.
    pub fn ordinal_labels(threshold_count: usize) -> Vec<f64> {
        (0..=threshold_count).map(|i| i as f64).collect()
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Marginal probability mass of each category under `N(0, 1)`.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn category_count(&self) -> usize {
        self.labels.len()
    }

    /// `(τ_{i}, τ_{i+1})` for category `i`, with infinite outer bounds.
    pub fn bounds(&self, category: usize) -> (f64, f64) {
        bounds_of(&self.thresholds, category)
    }

    /// Category index of a standardized latent value.
    ///
    /// Values equal to a threshold belong to the category above it.
    pub fn assign(&self, z: f64) -> usize {
        self.thresholds.partition_point(|&t| t <= z)
    }

    /// `E(Y) = Σ p_i ℓ_i`, accumulated relative to the first label.
    pub fn label_mean(&self) -> f64 {
        let base = self.labels[0];
        base + self.mean_offset(base)
    }

    /// `ℓ_i − E(Y)` for every category.
    ///
    /// Differences are taken against the first label before the mean is
    /// removed, so large common offsets in the labels cancel exactly.
    pub fn centred_labels(&self) -> Vec<f64> {
        let base = self.labels[0];
        let offset = self.mean_offset(base);
        self.labels.iter().map(|l| (l - base) - offset).collect()
    }

    /// `Var(Y) = Σ p_i (ℓ_i − E(Y))²`.
    pub fn label_variance(&self) -> f64 {
        self.probabilities
            .iter()
            .zip(self.centred_labels())
            .map(|(p, d)| p * d * d)
            .sum()
    }

    fn mean_offset(&self, base: f64) -> f64 {
        self.probabilities
            .iter()
            .zip(&self.labels)
            .map(|(p, l)| p * (l - base))
            .sum()
    }
}

fn bounds_of(thresholds: &[f64], category: usize) -> (f64, f64) {
    let lo = if category == 0 {
        f64::NEG_INFINITY
    } else {
        thresholds[category - 1]
    };
    let hi = thresholds.get(category).copied().unwrap_or(f64::INFINITY);
    (lo, hi)
}

/// Convert thresholds from raw units to z-scores of `N(mean, sd²)`.
///
/// The attenuation factor is invariant under affine transformations of the
/// latent variable, so this is all that is needed to support arbitrary means
/// and variances.
pub fn standardize_thresholds(raw: &[f64], mean: f64, sd: f64) -> Result<Vec<f64>, AttenuationError> {
    if !(mean.is_finite() && sd.is_finite() && sd > 0.0) {
        return Err(AttenuationError::InvalidParameters(format!(
            "latent mean must be finite and sd > 0 (mean={mean}, sd={sd})"
        )));
    }
    Ok(raw.iter().map(|&t| (t - mean) / sd).collect())
}

/// Output of the attenuation calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttenuationResult {
    pub attenuation_factor: f64,
    /// `attenuation_factor · rho`.
    pub attenuated_correlation: f64,
    pub latent_correlation: f64,
    /// `Cov(X, Y)` in standardized units of `X` and `Y*`.
    pub observed_covariance: f64,
    /// `Var(Y)` of the discretized variable.
    pub label_variance: f64,
}

/// Monte Carlo settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub samples: usize,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            samples: 10_000,
            seed: 42,
        }
    }
}
