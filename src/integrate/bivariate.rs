//! Partial moments of a bivariate normal over a rectangle.
//!
//! For `(X, Y) ~ N₂(μx, μy, σx, σy, ρ)` and a region `R = [lx, hx] × [ly, hy]`
//! we compute
//!
//! ```text
//! M_ab(R) = ∫∫_R x^a · y^b · f(x, y) dx dy,    a, b ∈ {0, 1}
//! ```
//!
//! Work happens in standardized coordinates `x = μx + σx u`, `y = μy + σy v`,
//! and the density is factored as `φ(v) · φ(w)` with `u = ρv + s·w`,
//! `s = sqrt(1 - ρ²)`. The inner variable `w` is therefore always a standard
//! normal, whatever `v` is, which keeps the inner integrand centred.
//!
//! Two strategies:
//!
//! - `Conditional`: the inner integral over `w` has a closed form
//!   (`Φ` differences and `φ` values), leaving an adaptive 1-D integral over `v`.
//! - `Iterated`: both integrals use adaptive Gauss–Kronrod. Slower, but shares
//!   no algebra with the closed form, so it doubles as a cross-check.

use log::debug;

use crate::domain::{BivariateNormalParams, Interval, QuadratureConfig, Region, Strategy};
use crate::error::AttenuationError;
use crate::math::{EvalBudget, Quadrature, Tolerance, gauss_kronrod, normal};

/// Inner integrals of the iterated strategy are solved this much tighter than
/// the outer one so their noise does not stall outer convergence.
const INNER_TOL_SCALE: f64 = 1e-2;
const INNER_REL_FLOOR: f64 = 1e-13;
const INNER_ABS_FLOOR: f64 = 1e-15;

/// Residual standard deviations kept either side of a ridge breakpoint.
const RIDGE_HALF_WIDTH: f64 = 8.0;

/// Which partial moment to integrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    /// `P((X, Y) ∈ R)`
    Mass,
    /// `E[X · 1_R]`
    X,
    /// `E[Y · 1_R]`
    Y,
    /// `E[X · Y · 1_R]`
    XY,
}

impl Moment {
    fn uses_x(self) -> bool {
        matches!(self, Moment::X | Moment::XY)
    }

    fn uses_y(self) -> bool {
        matches!(self, Moment::Y | Moment::XY)
    }
}

/// Compute `∫∫_R x · y · f(x, y) dx dy`.
///
/// `config` defaults to `QuadratureConfig::default()` when `None`.
pub fn integrate_bivariate_tail(
    region: Region,
    params: BivariateNormalParams,
    config: Option<QuadratureConfig>,
) -> Result<f64, AttenuationError> {
    let config = config.unwrap_or_default();
    partial_moment(region, params, Moment::XY, &config).map(|q| q.value)
}

/// Compute a partial moment of the bivariate normal over `region`.
///
/// Parameters, region and config are validated before any integrand is
/// evaluated. Exceeding `config.max_evals` before reaching the tolerance
/// yields `IntegrationFailure`.
pub fn partial_moment(
    region: Region,
    params: BivariateNormalParams,
    moment: Moment,
    config: &QuadratureConfig,
) -> Result<Quadrature, AttenuationError> {
    params.validate()?;
    region.validate()?;
    config.validate()?;

    let u_band = region.x.standardize(params.mean_x, params.sd_x);
    let v_band = region.y.standardize(params.mean_y, params.sd_y);

    let budget = EvalBudget::new(config.max_evals);
    let tol = Tolerance {
        abs: config.abs_tol,
        rel: config.rel_tol,
    };

    let integrand = MomentIntegrand {
        params,
        moment,
        u_band,
        inner_tol: Tolerance {
            abs: (config.abs_tol * INNER_TOL_SCALE).max(INNER_ABS_FLOOR),
            rel: (config.rel_tol * INNER_TOL_SCALE).max(INNER_REL_FLOOR),
        },
    };

    let cuts = integrand.outer_breakpoints(v_band);
    let piece_tol = Tolerance {
        abs: tol.abs / cuts.len().saturating_sub(1).max(1) as f64,
        rel: tol.rel,
    };
    let mut result = Quadrature {
        value: 0.0,
        error_estimate: 0.0,
        evaluations: 0,
    };
    for w in cuts.windows(2) {
        let piece = match config.strategy {
            Strategy::Conditional => gauss_kronrod(|v| Ok(integrand.conditional(v)), w[0], w[1], piece_tol, &budget),
            Strategy::Iterated => gauss_kronrod(|v| integrand.iterated(v, &budget), w[0], w[1], piece_tol, &budget),
        }?;
        result.value += piece.value;
        result.error_estimate += piece.error_estimate;
    }

    debug!(
        "partial moment {:?} over {:?} ({:?}): {:.10e} ± {:.2e} in {} evaluations",
        moment, region, config.strategy, result.value, result.error_estimate, budget.used()
    );

    Ok(Quadrature {
        evaluations: budget.used(),
        ..result
    })
}

struct MomentIntegrand {
    params: BivariateNormalParams,
    moment: Moment,
    /// x-range in standardized units.
    u_band: Interval,
    inner_tol: Tolerance,
}

impl MomentIntegrand {
    /// Weight contributed by `y`: `μy + σy v`, or 1.
    fn y_weight(&self, v: f64) -> f64 {
        if self.moment.uses_y() {
            self.params.mean_y + self.params.sd_y * v
        } else {
            1.0
        }
    }

    /// Weight contributed by `x`: `μx + σx u`, or 1.
    fn x_weight(&self, u: f64) -> f64 {
        if self.moment.uses_x() {
            self.params.mean_x + self.params.sd_x * u
        } else {
            1.0
        }
    }

    /// Split points for the outer `v` integral, including both ends.
    ///
    /// Near `|ρ| = 1` the inner mass is a narrow ridge around `v = u/ρ` for
    /// each finite edge `u` of the x-band; cutting there (and a few residual
    /// widths either side) keeps a single Kronrod rule from stepping over it.
    fn outer_breakpoints(&self, v_band: Interval) -> Vec<f64> {
        let mut cuts = vec![v_band.lo, v_band.hi];
        let rho = self.params.rho;
        if rho != 0.0 {
            let half = RIDGE_HALF_WIDTH * self.params.residual_sd() / rho.abs();
            for edge in [self.u_band.lo, self.u_band.hi] {
                let centre = edge / rho;
                for v in [centre - half, centre, centre + half] {
                    if v.is_finite() && v > v_band.lo && v < v_band.hi {
                        cuts.push(v);
                    }
                }
            }
        }
        cuts.sort_by(f64::total_cmp);
        cuts.dedup();
        cuts
    }

    /// `w`-range corresponding to the `u`-range at a given `v`.
    fn w_band(&self, v: f64) -> (f64, f64, f64) {
        let s = self.params.residual_sd();
        let m = self.params.rho * v;
        ((self.u_band.lo - m) / s, (self.u_band.hi - m) / s, m)
    }

    /// Outer integrand with the inner integral in closed form.
    fn conditional(&self, v: f64) -> f64 {
        let density = normal::pdf(v);
        if density == 0.0 {
            return 0.0;
        }
        let (alpha, beta, m) = self.w_band(v);
        let mass = normal::interval_mass(alpha, beta);
        let inner = if self.moment.uses_x() {
            // ∫ u φ(w) dw with u = m + s w.
            let s = self.params.residual_sd();
            let first = m * mass + s * (normal::pdf(alpha) - normal::pdf(beta));
            self.params.mean_x * mass + self.params.sd_x * first
        } else {
            mass
        };
        density * self.y_weight(v) * inner
    }

    /// Outer integrand with the inner integral done by adaptive quadrature.
    fn iterated(&self, v: f64, budget: &EvalBudget) -> Result<f64, AttenuationError> {
        let density = normal::pdf(v);
        if density == 0.0 {
            return Ok(0.0);
        }
        let (alpha, beta, m) = self.w_band(v);
        let s = self.params.residual_sd();
        let inner = gauss_kronrod(
            |w| Ok(self.x_weight(m + s * w) * normal::pdf(w)),
            alpha,
            beta,
            self.inner_tol,
            budget,
        )?;
        Ok(density * self.y_weight(v) * inner.value)
    }
}
