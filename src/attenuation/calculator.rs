//! Attenuation factor of a discretized latent normal variable.
//!
//! Given `(X, Y*)` standard bivariate normal with correlation `ρ` and an
//! observed `Y = ℓ_i` whenever `Y* ∈ [τ_{i-1}, τ_i)`, the observed correlation is
//!
//! ```text
//! corr(X, Y) = Cov(X, Y) / sqrt(Var(X) · Var(Y))
//! Cov(X, Y)  = Σ_i ℓ_i · E[X · 1{Y* ∈ category i}]
//! ```
//!
//! and the attenuation factor is `corr(X, Y) / ρ`, i.e.
//! `(Cov(X, Y) / ρ) · sqrt(Var(Y*) / Var(Y))` with `Var(Y*) = 1`.
//!
//! Each `E[X · 1{…}]` is a partial moment over the band
//! `(-∞, ∞) × [τ_{i-1}, τ_i)`, computed by the bivariate integrator.
//! Raw-unit thresholds are standardized first; the factor does not depend on
//! the latent mean or variance.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::domain::{AttenuationResult, BivariateNormalParams, CategoryScheme, QuadratureConfig, Region};
use crate::error::AttenuationError;
use crate::integrate::{Moment, partial_moment};
use crate::math::normal;

/// `Var(Y)` at or below this is treated as zero.
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// The factor depends only on the scheme, so at `ρ = 0` (where `Cov / ρ` is
/// 0/0) it is evaluated at this correlation instead.
pub const REFERENCE_RHO: f64 = 0.5;

/// Attenuation for standardized latent variables with integer labels.
///
/// `thresholds` are z-scores (e.g. `qnorm(p)`); `labels` must have one more
/// entry than `thresholds`.
pub fn compute_attenuation(
    rho: f64,
    thresholds: &[f64],
    labels: &[i64],
) -> Result<AttenuationResult, AttenuationError> {
    let labels = labels.iter().map(|&l| l as f64).collect();
    let scheme = CategoryScheme::new(thresholds.to_vec(), labels)?;
    compute_attenuation_with(rho, &scheme, &QuadratureConfig::default())
}

/// Attenuation for thresholds in the raw units of `Y*`.
///
/// `params.mean_y` / `params.sd_y` standardize the thresholds; the remaining
/// parameters only contribute `ρ`.
pub fn compute_attenuation_raw(
    params: BivariateNormalParams,
    raw_thresholds: &[f64],
    labels: Vec<f64>,
    config: &QuadratureConfig,
) -> Result<AttenuationResult, AttenuationError> {
    params.validate()?;
    let scheme = CategoryScheme::from_raw(raw_thresholds, labels, params.mean_y, params.sd_y)?;
    compute_attenuation_with(params.rho, &scheme, config)
}

/// Attenuation for an already-built scheme.
pub fn compute_attenuation_with(
    rho: f64,
    scheme: &CategoryScheme,
    config: &QuadratureConfig,
) -> Result<AttenuationResult, AttenuationError> {
    BivariateNormalParams::standard(rho).validate()?;
    config.validate()?;

    let label_variance = scheme.label_variance();
    if !(label_variance > VARIANCE_FLOOR) {
        return Err(AttenuationError::DegenerateVariance(label_variance));
    }

    let rho_eval = if rho == 0.0 {
        warn!("rho = 0: evaluating the attenuation factor at reference rho {REFERENCE_RHO}");
        REFERENCE_RHO
    } else {
        rho
    };
    let params = BivariateNormalParams::standard(rho_eval);

    let integrals = category_integrals(scheme, params, config)?;
    // Σ I_i = E[X] = 0, so centring the labels leaves the covariance unchanged.
    let numerator: f64 = integrals
        .iter()
        .zip(scheme.centred_labels())
        .map(|(integral, label)| label * integral)
        .sum();

    // Var(Y*) = 1 in standardized units.
    let attenuation_factor = (numerator / rho_eval) * (1.0 / label_variance).sqrt();
    let attenuated_correlation = attenuation_factor * rho;

    info!(
        "attenuation: k={} rho={rho} factor={attenuation_factor:.6} corr={attenuated_correlation:.6}",
        scheme.category_count()
    );

    Ok(AttenuationResult {
        attenuation_factor,
        attenuated_correlation,
        latent_correlation: rho,
        observed_covariance: attenuated_correlation * label_variance.sqrt(),
        label_variance,
    })
}

/// `E[X · 1{Y* ∈ category i}]` for every category, in category order.
fn category_integrals(
    scheme: &CategoryScheme,
    params: BivariateNormalParams,
    config: &QuadratureConfig,
) -> Result<Vec<f64>, AttenuationError> {
    // Categories are independent; collect keeps the order so the weighted
    // sum below is bit-identical across runs.
    (0..scheme.category_count())
        .into_par_iter()
        .map(|i| {
            let (lo, hi) = scheme.bounds(i);
            let q = partial_moment(Region::y_band(lo, hi), params, Moment::X, config)?;
            debug!(
                "category {i} [{lo:.4}, {hi:.4}): E[X·1] = {:.10e} ({} evaluations)",
                q.value, q.evaluations
            );
            Ok(q.value)
        })
        .collect()
}

/// Closed-form attenuation factor for a 0/1 split with `P(Y = 0) = p`.
///
/// `φ(Φ⁻¹(p)) / sqrt(p (1 - p))` (the point-biserial attenuation).
pub fn dichotomous_attenuation(p: f64) -> Result<f64, AttenuationError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(AttenuationError::InvalidScheme(format!(
            "category probability must lie in [0, 1], got {p}"
        )));
    }
    let variance = p * (1.0 - p);
    if !(variance > VARIANCE_FLOOR) {
        return Err(AttenuationError::DegenerateVariance(variance));
    }
    Ok(normal::pdf(normal::quantile(p)) / variance.sqrt())
}
