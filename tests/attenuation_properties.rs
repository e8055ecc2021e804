use approx::assert_abs_diff_eq;

use attenuation::domain::{Interval, SimulationConfig, Strategy};
use attenuation::math::normal;
use attenuation::{
    AttenuationError, BivariateNormalParams, CategoryScheme, QuadratureConfig, Region, compute_attenuation,
    compute_attenuation_with, integrate_bivariate_tail, simulate_attenuation,
};

fn params(mean_x: f64, mean_y: f64, sd_x: f64, sd_y: f64, rho: f64) -> BivariateNormalParams {
    BivariateNormalParams {
        mean_x,
        mean_y,
        sd_x,
        sd_y,
        rho,
    }
}

#[test]
fn full_plane_recovers_the_raw_cross_moment() {
    for p in [
        params(0.0, 0.0, 1.0, 1.0, 0.5),
        params(1.5, -2.0, 0.7, 3.0, -0.35),
        params(-0.4, 0.9, 2.0, 0.5, 0.9),
    ] {
        let expected = p.rho * p.sd_x * p.sd_y + p.mean_x * p.mean_y;
        let value = integrate_bivariate_tail(Region::full(), p, None).unwrap();
        assert_abs_diff_eq!(value, expected, epsilon = 1e-6);
    }
}

#[test]
fn bands_partition_the_plane() {
    let p = params(0.3, -0.2, 1.2, 0.8, 0.45);
    let cuts = [f64::NEG_INFINITY, -1.0, -0.1, 0.6, f64::INFINITY];
    let total: f64 = cuts
        .windows(2)
        .map(|w| integrate_bivariate_tail(Region::y_band(w[0], w[1]), p, None).unwrap())
        .sum();
    let whole = integrate_bivariate_tail(Region::full(), p, None).unwrap();
    assert_abs_diff_eq!(total, whole, epsilon = 1e-7);
}

#[test]
fn strategies_agree_on_a_bounded_rectangle() {
    let p = params(0.0, 0.0, 1.0, 1.0, 0.6);
    let region = Region::new(Interval::new(-0.5, 2.0), Interval::new(0.25, f64::INFINITY));
    let conditional = integrate_bivariate_tail(region, p, None).unwrap();
    let iterated = integrate_bivariate_tail(
        region,
        p,
        Some(QuadratureConfig {
            strategy: Strategy::Iterated,
            ..QuadratureConfig::default()
        }),
    )
    .unwrap();
    assert_abs_diff_eq!(conditional, iterated, epsilon = 1e-7);
}

#[test]
fn attenuation_is_idempotent() {
    let a = compute_attenuation(0.5, &[-0.5, 0.5], &[0, 1, 2]).unwrap();
    let b = compute_attenuation(0.5, &[-0.5, 0.5], &[0, 1, 2]).unwrap();
    assert_eq!(a, b);
}

#[test]
fn dichotomous_factor_matches_the_closed_form() {
    let tau = normal::quantile(0.3);
    let result = compute_attenuation(0.5, &[tau], &[0, 1]).unwrap();
    assert_abs_diff_eq!(result.attenuation_factor, 0.758729, epsilon = 1e-5);
    assert_abs_diff_eq!(result.attenuated_correlation, 0.379365, epsilon = 1e-5);
    assert_abs_diff_eq!(result.label_variance, 0.21, epsilon = 1e-12);
}

#[test]
fn four_categories_match_the_density_difference_identity() {
    let scheme =
        CategoryScheme::from_cumulative_probs(&[0.5, 0.8, 0.9], CategoryScheme::ordinal_labels(3)).unwrap();
    let result = compute_attenuation_with(0.5, &scheme, &QuadratureConfig::default()).unwrap();

    // Cov(Y*, Y) = Σ ℓ_i (φ(τ_{i-1}) - φ(τ_i)).
    let mut bounds = vec![f64::NEG_INFINITY];
    bounds.extend_from_slice(scheme.thresholds());
    bounds.push(f64::INFINITY);
    let cov: f64 = scheme
        .labels()
        .iter()
        .enumerate()
        .map(|(i, l)| l * (normal::pdf(bounds[i]) - normal::pdf(bounds[i + 1])))
        .sum();

    assert_abs_diff_eq!(result.label_variance, 0.96, epsilon = 1e-12);
    assert_abs_diff_eq!(result.attenuation_factor, cov / 0.96f64.sqrt(), epsilon = 1e-6);
    assert_abs_diff_eq!(result.attenuated_correlation, 0.5 * cov / 0.96f64.sqrt(), epsilon = 1e-6);
}

#[test]
fn analytic_and_simulated_correlations_agree() {
    let config = SimulationConfig {
        samples: 200_000,
        seed: 2024,
    };
    for probs in [vec![0.3], vec![0.5, 0.8, 0.9]] {
        let scheme = CategoryScheme::from_cumulative_probs(&probs, CategoryScheme::ordinal_labels(probs.len())).unwrap();
        let analytic = compute_attenuation_with(0.5, &scheme, &QuadratureConfig::default()).unwrap();
        let simulated = simulate_attenuation(BivariateNormalParams::standard(0.5), &scheme, &config).unwrap();
        assert_abs_diff_eq!(simulated.observed_correlation, analytic.attenuated_correlation, epsilon = 0.01);
    }
}

#[test]
fn all_mass_in_one_category_is_degenerate() {
    for tau in [f64::INFINITY, f64::NEG_INFINITY] {
        let err = compute_attenuation(0.5, &[tau], &[0, 1]).unwrap_err();
        assert!(matches!(err, AttenuationError::DegenerateVariance(_)));
    }
}

#[test]
fn singular_or_scale_free_parameters_are_rejected() {
    for rho in [1.0, -1.0] {
        let err = integrate_bivariate_tail(Region::full(), params(0.0, 0.0, 1.0, 1.0, rho), None).unwrap_err();
        assert!(matches!(err, AttenuationError::InvalidParameters(_)));
        let err = compute_attenuation(rho, &[0.0], &[0, 1]).unwrap_err();
        assert!(matches!(err, AttenuationError::InvalidParameters(_)));
    }
    let err = integrate_bivariate_tail(Region::full(), params(0.0, 0.0, 0.0, 1.0, 0.5), None).unwrap_err();
    assert!(matches!(err, AttenuationError::InvalidParameters(_)));
}

#[test]
fn malformed_schemes_are_rejected() {
    assert!(matches!(
        compute_attenuation(0.5, &[0.5, -0.5], &[0, 1, 2]),
        Err(AttenuationError::InvalidScheme(_))
    ));
    assert!(matches!(
        compute_attenuation(0.5, &[0.0], &[0, 1, 2]),
        Err(AttenuationError::InvalidScheme(_))
    ));
}

#[test]
fn a_starved_budget_reports_integration_failure() {
    let scheme = CategoryScheme::new(vec![-0.3, 0.4], vec![0.0, 1.0, 2.0]).unwrap();
    let config = QuadratureConfig {
        max_evals: 15,
        rel_tol: 1e-12,
        abs_tol: 1e-15,
        ..QuadratureConfig::default()
    };
    let err = compute_attenuation_with(0.5, &scheme, &config).unwrap_err();
    assert!(matches!(err, AttenuationError::IntegrationFailure { .. }));
}
