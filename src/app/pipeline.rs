//! Shared "compare pipeline": analytic attenuation plus a Monte Carlo check.
//!
//! Both `attenuate compare` and the integration tests go through here so the
//! analytic and simulated sides are always built from the same scheme.

use log::info;

use crate::attenuation::compute_attenuation_with;
use crate::domain::{BivariateNormalParams, CategoryScheme, QuadratureConfig, SimulationConfig};
use crate::error::AttenuationError;
use crate::report::Comparison;
use crate::simulate::simulate_attenuation;

/// Run the analytic calculator and the simulator for one scheme.
///
/// `params` carries `ρ` and the raw-unit margins of `(X, Y*)`; `scheme` is in
/// z-score units.
pub fn run_comparison(
    params: BivariateNormalParams,
    scheme: &CategoryScheme,
    quadrature: &QuadratureConfig,
    simulation: &SimulationConfig,
) -> Result<Comparison, AttenuationError> {
    params.validate()?;

    // 1) Analytic factor from the bivariate integrals.
    let analytic = compute_attenuation_with(params.rho, scheme, quadrature)?;

    // 2) Simulated correlation for the same scheme.
    let simulated = simulate_attenuation(params, scheme, simulation)?;

    let cmp = Comparison::new(scheme, analytic, simulated);
    info!("comparison: max |analytic - simulated| = {:.4}", cmp.max_abs_diff());
    Ok(cmp)
}
