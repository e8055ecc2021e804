//! Seeded bivariate-normal sampler and simulated attenuation.

use log::{debug, info};
use nalgebra::{Matrix2, Vector2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::{BivariateNormalParams, CategoryScheme, SimulationConfig};
use crate::error::AttenuationError;

/// Result of one Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub samples: usize,
    pub seed: u64,
    /// Sample `corr(X, Y*)`.
    pub latent_correlation: f64,
    /// Sample `corr(X, Y)` after discretization.
    pub observed_correlation: f64,
    /// `observed / latent`; `None` when the latent sample correlation is zero.
    pub attenuation_factor: Option<f64>,
    /// Observations per category.
    pub category_counts: Vec<usize>,
}

/// Draw `config.samples` pairs from `N₂(params)`.
///
/// Standard normal pairs are correlated with the Cholesky factor of the
/// correlation matrix, then scaled and shifted to the requested margins.
pub fn draw_pairs(
    params: BivariateNormalParams,
    config: &SimulationConfig,
) -> Result<Vec<(f64, f64)>, AttenuationError> {
    params.validate()?;

    let corr = Matrix2::new(1.0, params.rho, params.rho, 1.0);
    let chol = corr.cholesky().ok_or_else(|| {
        AttenuationError::InvalidParameters(format!(
            "correlation matrix is not positive definite (rho={})",
            params.rho
        ))
    })?;
    let l = chol.l();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AttenuationError::InvalidConfig(format!("noise distribution error: {e}")))?;

    let mut pairs = Vec::with_capacity(config.samples);
    for _ in 0..config.samples {
        let z = Vector2::new(normal.sample(&mut rng), normal.sample(&mut rng));
        let uv = l * z;
        pairs.push((
            params.mean_x + params.sd_x * uv[0],
            params.mean_y + params.sd_y * uv[1],
        ));
    }
    Ok(pairs)
}

/// Simulate `corr(X, Y)` for a discretized `Y*`.
///
/// `scheme` is in z-score units; draws are standardized with
/// `params.mean_y` / `params.sd_y` before category assignment.
pub fn simulate_attenuation(
    params: BivariateNormalParams,
    scheme: &CategoryScheme,
    config: &SimulationConfig,
) -> Result<SimulationOutcome, AttenuationError> {
    if config.samples < 2 {
        return Err(AttenuationError::InvalidConfig(format!(
            "at least 2 samples are required, got {}",
            config.samples
        )));
    }

    let pairs = draw_pairs(params, config)?;

    let mut xs = Vec::with_capacity(pairs.len());
    let mut latent = Vec::with_capacity(pairs.len());
    let mut observed = Vec::with_capacity(pairs.len());
    let mut category_counts = vec![0usize; scheme.category_count()];

    for &(x, y) in &pairs {
        let category = scheme.assign((y - params.mean_y) / params.sd_y);
        category_counts[category] += 1;
        xs.push(x);
        latent.push(y);
        observed.push(scheme.labels()[category]);
    }
    debug!("simulated category counts: {category_counts:?}");

    let latent_correlation = pearson(&xs, &latent).ok_or_else(|| {
        AttenuationError::InvalidConfig("latent sample has zero variance".to_string())
    })?;
    let observed_correlation =
        pearson(&xs, &observed).ok_or(AttenuationError::DegenerateVariance(0.0))?;

    let attenuation_factor = if latent_correlation != 0.0 {
        Some(observed_correlation / latent_correlation)
    } else {
        None
    };

    info!(
        "simulation: n={} seed={} r(X,Y*)={latent_correlation:.4} r(X,Y)={observed_correlation:.4}",
        config.samples, config.seed
    );

    Ok(SimulationOutcome {
        samples: config.samples,
        seed: config.seed,
        latent_correlation,
        observed_correlation,
        attenuation_factor,
        category_counts,
    })
}

/// Sample Pearson correlation.
///
/// `None` for mismatched lengths, fewer than two points, or a zero-variance input.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attenuation::{compute_attenuation, compute_attenuation_with};
    use crate::domain::QuadratureConfig;
    use crate::math::normal;
    use approx::assert_abs_diff_eq;

    fn sim(samples: usize, seed: u64) -> SimulationConfig {
        SimulationConfig { samples, seed }
    }

    #[test]
    fn pearson_handles_simple_and_degenerate_inputs() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0, epsilon = 1e-15);
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&x, &[1.0, 2.0]), None);
    }

    #[test]
    fn draws_are_reproducible_and_have_the_requested_moments() {
        let params = BivariateNormalParams {
            mean_x: 2.0,
            mean_y: -1.0,
            sd_x: 0.5,
            sd_y: 3.0,
            rho: -0.4,
        };
        let a = draw_pairs(params, &sim(100_000, 7)).unwrap();
        let b = draw_pairs(params, &sim(100_000, 7)).unwrap();
        assert_eq!(a, b);

        let xs: Vec<f64> = a.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = a.iter().map(|p| p.1).collect();
        let n = xs.len() as f64;
        assert_abs_diff_eq!(xs.iter().sum::<f64>() / n, 2.0, epsilon = 0.01);
        assert_abs_diff_eq!(ys.iter().sum::<f64>() / n, -1.0, epsilon = 0.05);
        assert_abs_diff_eq!(pearson(&xs, &ys).unwrap(), -0.4, epsilon = 0.015);
    }

    #[test]
    fn dichotomous_simulation_agrees_with_the_integrator() {
        let tau = normal::quantile(0.3);
        let analytic = compute_attenuation(0.5, &[tau], &[0, 1]).unwrap();
        let scheme = CategoryScheme::new(vec![tau], vec![0.0, 1.0]).unwrap();

        let large = simulate_attenuation(BivariateNormalParams::standard(0.5), &scheme, &sim(200_000, 11)).unwrap();
        assert_abs_diff_eq!(large.observed_correlation, analytic.attenuated_correlation, epsilon = 0.01);
        assert_abs_diff_eq!(large.attenuation_factor.unwrap(), analytic.attenuation_factor, epsilon = 0.02);

        // Blog-sized run: 10,000 draws.
        let small = simulate_attenuation(BivariateNormalParams::standard(0.5), &scheme, &sim(10_000, 42)).unwrap();
        assert_abs_diff_eq!(small.observed_correlation, analytic.attenuated_correlation, epsilon = 0.035);
        assert_eq!(small.category_counts.iter().sum::<usize>(), 10_000);
    }

    #[test]
    fn four_category_simulation_agrees_with_the_integrator() {
        let scheme =
            CategoryScheme::from_cumulative_probs(&[0.5, 0.8, 0.9], CategoryScheme::ordinal_labels(3)).unwrap();
        let analytic = compute_attenuation_with(0.5, &scheme, &QuadratureConfig::default()).unwrap();
        let outcome =
            simulate_attenuation(BivariateNormalParams::standard(0.5), &scheme, &sim(200_000, 3)).unwrap();

        assert_abs_diff_eq!(outcome.observed_correlation, analytic.attenuated_correlation, epsilon = 0.01);

        let n = outcome.samples as f64;
        for (count, p) in outcome.category_counts.iter().zip(scheme.probabilities()) {
            assert_abs_diff_eq!(*count as f64 / n, *p, epsilon = 0.005);
        }
    }

    #[test]
    fn raw_unit_draws_are_standardized_before_assignment() {
        let params = BivariateNormalParams {
            mean_x: 5.0,
            mean_y: 100.0,
            sd_x: 2.0,
            sd_y: 15.0,
            rho: 0.6,
        };
        let scheme = CategoryScheme::from_raw(&[90.0, 110.0], CategoryScheme::ordinal_labels(2), 100.0, 15.0).unwrap();
        let analytic = compute_attenuation_with(0.6, &scheme, &QuadratureConfig::default()).unwrap();
        let outcome = simulate_attenuation(params, &scheme, &sim(200_000, 5)).unwrap();
        assert_abs_diff_eq!(outcome.observed_correlation, analytic.attenuated_correlation, epsilon = 0.01);
    }

    #[test]
    fn too_few_samples_is_a_config_error() {
        let scheme = CategoryScheme::new(vec![0.0], vec![0.0, 1.0]).unwrap();
        for n in [0, 1] {
            assert!(matches!(
                simulate_attenuation(BivariateNormalParams::standard(0.5), &scheme, &sim(n, 1)),
                Err(AttenuationError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn empty_observed_variation_is_degenerate() {
        let scheme = CategoryScheme::new(vec![f64::INFINITY], vec![0.0, 1.0]).unwrap();
        let err = simulate_attenuation(BivariateNormalParams::standard(0.5), &scheme, &sim(1_000, 1)).unwrap_err();
        assert!(matches!(err, AttenuationError::DegenerateVariance(_)));
    }
}
