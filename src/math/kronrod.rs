//! Adaptive Gauss–Kronrod quadrature (7-point Gauss / 15-point Kronrod).
//!
//! Global adaptive bisection in the QUADPACK `QAG` style:
//!
//! - apply the 15-point Kronrod rule to the whole interval
//! - repeatedly bisect the sub-interval with the largest error estimate
//! - stop once the summed error estimate is below `max(abs_tol, rel_tol·|I|)`
//!
//! Unbounded intervals are mapped onto finite ones before integration:
//!
//! ```text
//! (-∞, ∞):  x = t / (1 - t²),      t ∈ (-1, 1)
//! [a, ∞):   x = a + t / (1 - t),   t ∈ [0, 1)
//! (-∞, b]:  x = b - (1 - t) / t,   t ∈ (0, 1]
//! ```
//!
//! Kronrod nodes are interior points, so the singular endpoints of these maps
//! are never evaluated.
//!
//! Integrands are fallible so that a nested integral (the inner integral of an
//! iterated 2-D rule) can surface its own failure through the outer one.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::AttenuationError;

/// Kronrod abscissae on `[-1, 1]` (non-negative half, descending).
const XGK: [f64; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

/// Kronrod weights matching `XGK`.
const WGK: [f64; 8] = [
    0.022_935_322_010_529_22,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_18,
    0.140_653_259_715_525_92,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_83,
];

/// Gauss weights for the odd-indexed Kronrod nodes `XGK[1], XGK[3], XGK[5], XGK[7]`.
const WG: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

/// Integrand evaluations per application of the 15-point rule.
pub const EVALS_PER_RULE: usize = 15;

/// Shared evaluation counter.
///
/// Nested integrations share one budget so that the limit applies to the total
/// number of integrand evaluations of a whole 2-D integral.
#[derive(Debug)]
pub struct EvalBudget {
    limit: usize,
    used: Cell<usize>,
}

impl EvalBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: Cell::new(0),
        }
    }

    pub fn used(&self) -> usize {
        self.used.get()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn can_afford(&self, evals: usize) -> bool {
        self.used.get().saturating_add(evals) <= self.limit
    }

    fn charge(&self, evals: usize) {
        self.used.set(self.used.get().saturating_add(evals));
    }
}

/// Result of a converged 1-D integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub value: f64,
    pub error_estimate: f64,
    /// Evaluations spent by this call (nested integrals report their own).
    pub evaluations: usize,
}

/// Tolerances for a single 1-D integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub abs: f64,
    pub rel: f64,
}

impl Tolerance {
    fn target(self, estimate: f64) -> f64 {
        self.abs.max(self.rel * estimate.abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mapping {
    Finite,
    /// `(-∞, ∞)`
    Both,
    /// `[a, ∞)`
    Upper(f64),
    /// `(-∞, b]`
    Lower(f64),
}

impl Mapping {
    /// Map `t` to `x` and return `(x, dx/dt)`.
    fn apply(self, t: f64) -> (f64, f64) {
        match self {
            Mapping::Finite => (t, 1.0),
            Mapping::Both => {
                let d = 1.0 - t * t;
                (t / d, (1.0 + t * t) / (d * d))
            }
            Mapping::Upper(a) => {
                let d = 1.0 - t;
                (a + t / d, 1.0 / (d * d))
            }
            Mapping::Lower(b) => (b - (1.0 - t) / t, 1.0 / (t * t)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    estimate: f64,
    error: f64,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on error; ties broken by position for determinism.
        self.error
            .total_cmp(&other.error)
            .then_with(|| other.a.total_cmp(&self.a))
    }
}

/// Integrate `f` over `[lo, hi]`, where either bound may be infinite.
///
/// Fails with `IntegrationFailure` when the budget runs out (or the interval
/// can no longer be bisected) before the error target is met, and with
/// `InvalidParameters` for NaN or reversed bounds.
pub fn gauss_kronrod<F>(
    mut f: F,
    lo: f64,
    hi: f64,
    tol: Tolerance,
    budget: &EvalBudget,
) -> Result<Quadrature, AttenuationError>
where
    F: FnMut(f64) -> Result<f64, AttenuationError>,
{
    if lo.is_nan() || hi.is_nan() {
        return Err(AttenuationError::InvalidParameters(
            "integration bounds must not be NaN".to_string(),
        ));
    }
    if lo > hi {
        return Err(AttenuationError::InvalidParameters(format!(
            "integration bounds out of order: lo={lo}, hi={hi}"
        )));
    }
    if lo == hi {
        return Ok(Quadrature {
            value: 0.0,
            error_estimate: 0.0,
            evaluations: 0,
        });
    }

    let (mapping, ta, tb) = match (lo.is_infinite(), hi.is_infinite()) {
        (false, false) => (Mapping::Finite, lo, hi),
        (true, true) => (Mapping::Both, -1.0, 1.0),
        (false, true) => (Mapping::Upper(lo), 0.0, 1.0),
        (true, false) => (Mapping::Lower(hi), 0.0, 1.0),
    };

    let mut g = |t: f64| -> Result<f64, AttenuationError> {
        let (x, jac) = mapping.apply(t);
        if !jac.is_finite() || x.is_infinite() {
            return Ok(0.0);
        }
        let y = f(x)?;
        if y == 0.0 {
            return Ok(0.0);
        }
        Ok(y * jac)
    };

    let start = budget.used();
    let fail = |estimate: f64, error: f64| AttenuationError::IntegrationFailure {
        evaluations: budget.used() - start,
        estimate,
        error_estimate: error,
    };

    if !budget.can_afford(EVALS_PER_RULE) {
        return Err(fail(f64::NAN, f64::INFINITY));
    }
    let (estimate, error) = kronrod_rule(&mut g, ta, tb, budget)?;

    let mut heap = BinaryHeap::new();
    heap.push(Segment {
        a: ta,
        b: tb,
        estimate,
        error,
    });
    let mut total = estimate;
    let mut total_err = error;

    while total_err > tol.target(total) {
        if !budget.can_afford(2 * EVALS_PER_RULE) {
            return Err(fail(total, total_err));
        }
        let Some(worst) = heap.pop() else {
            break;
        };
        let mid = 0.5 * (worst.a + worst.b);
        if mid <= worst.a || mid >= worst.b {
            // Interval exhausted at machine precision.
            return Err(fail(total, total_err));
        }

        let (left_est, left_err) = kronrod_rule(&mut g, worst.a, mid, budget)?;
        let (right_est, right_err) = kronrod_rule(&mut g, mid, worst.b, budget)?;

        total += left_est + right_est - worst.estimate;
        total_err += left_err + right_err - worst.error;

        heap.push(Segment {
            a: worst.a,
            b: mid,
            estimate: left_est,
            error: left_err,
        });
        heap.push(Segment {
            a: mid,
            b: worst.b,
            estimate: right_est,
            error: right_err,
        });

        // Running sums drift; refresh them from the heap now and then.
        if heap.len() % 64 == 0 {
            total = heap.iter().map(|s| s.estimate).sum();
            total_err = heap.iter().map(|s| s.error).sum();
        }
    }

    // Summation in a fixed order keeps results bit-identical across calls.
    let mut segments = heap.into_vec();
    segments.sort_by(|l, r| l.a.total_cmp(&r.a));
    let value = segments.iter().map(|s| s.estimate).sum();
    let error_estimate = segments.iter().map(|s| s.error).sum();

    Ok(Quadrature {
        value,
        error_estimate,
        evaluations: budget.used() - start,
    })
}

/// Apply the 15-point Kronrod rule on `[a, b]`; returns `(estimate, error)`.
fn kronrod_rule<G>(g: &mut G, a: f64, b: f64, budget: &EvalBudget) -> Result<(f64, f64), AttenuationError>
where
    G: FnMut(f64) -> Result<f64, AttenuationError>,
{
    budget.charge(EVALS_PER_RULE);

    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let mut fv1 = [0.0; 7];
    let mut fv2 = [0.0; 7];

    let fc = g(center)?;
    let mut res_g = fc * WG[3];
    let mut res_k = fc * WGK[7];
    let mut res_abs = res_k.abs();

    for j in 0..3 {
        let jtw = 2 * j + 1;
        let dx = half * XGK[jtw];
        let f1 = g(center - dx)?;
        let f2 = g(center + dx)?;
        fv1[jtw] = f1;
        fv2[jtw] = f2;
        res_g += WG[j] * (f1 + f2);
        res_k += WGK[jtw] * (f1 + f2);
        res_abs += WGK[jtw] * (f1.abs() + f2.abs());
    }
    for j in 0..4 {
        let jtwm1 = 2 * j;
        let dx = half * XGK[jtwm1];
        let f1 = g(center - dx)?;
        let f2 = g(center + dx)?;
        fv1[jtwm1] = f1;
        fv2[jtwm1] = f2;
        res_k += WGK[jtwm1] * (f1 + f2);
        res_abs += WGK[jtwm1] * (f1.abs() + f2.abs());
    }

    let mean = 0.5 * res_k;
    let mut res_asc = WGK[7] * (fc - mean).abs();
    for j in 0..7 {
        res_asc += WGK[j] * ((fv1[j] - mean).abs() + (fv2[j] - mean).abs());
    }

    let estimate = res_k * half;
    let res_abs = res_abs * half.abs();
    let res_asc = res_asc * half.abs();
    let mut error = ((res_k - res_g) * half).abs();

    if res_asc != 0.0 && error != 0.0 {
        error = res_asc * (200.0 * error / res_asc).powf(1.5).min(1.0);
    }
    if res_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        error = error.max(50.0 * f64::EPSILON * res_abs);
    }

    if !(estimate.is_finite() && error.is_finite()) {
        return Err(AttenuationError::IntegrationFailure {
            evaluations: EVALS_PER_RULE,
            estimate,
            error_estimate: error,
        });
    }

    Ok((estimate, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TIGHT: Tolerance = Tolerance { abs: 1e-12, rel: 1e-10 };

    fn ok(f: impl Fn(f64) -> f64) -> impl FnMut(f64) -> Result<f64, AttenuationError> {
        move |x| Ok(f(x))
    }

    #[test]
    fn integrates_polynomial_exactly_in_one_rule() {
        let budget = EvalBudget::new(1_000);
        let q = gauss_kronrod(ok(|x| x * x * x - 2.0 * x), 0.0, 3.0, TIGHT, &budget).unwrap();
        assert_relative_eq!(q.value, 81.0 / 4.0 - 9.0, epsilon = 1e-12);
        assert_eq!(q.evaluations, EVALS_PER_RULE);
    }

    #[test]
    fn integrates_gaussian_over_the_whole_line() {
        let budget = EvalBudget::new(100_000);
        let q = gauss_kronrod(ok(|x| (-x * x).exp()), f64::NEG_INFINITY, f64::INFINITY, TIGHT, &budget).unwrap();
        assert_relative_eq!(q.value, std::f64::consts::PI.sqrt(), max_relative = 1e-9);
    }

    #[test]
    fn integrates_semi_infinite_tails() {
        let budget = EvalBudget::new(100_000);
        let upper = gauss_kronrod(ok(|x| (-x).exp()), 1.0, f64::INFINITY, TIGHT, &budget).unwrap();
        assert_relative_eq!(upper.value, (-1.0f64).exp(), max_relative = 1e-9);

        let lower = gauss_kronrod(ok(|x| x.exp()), f64::NEG_INFINITY, -2.0, TIGHT, &budget).unwrap();
        assert_relative_eq!(lower.value, (-2.0f64).exp(), max_relative = 1e-9);
    }

    #[test]
    fn empty_interval_is_zero_without_evaluations() {
        let budget = EvalBudget::new(10);
        let q = gauss_kronrod(ok(|_| panic!("must not evaluate")), 1.5, 1.5, TIGHT, &budget).unwrap();
        assert_eq!(q.value, 0.0);
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn exhausted_budget_is_reported_not_approximated() {
        // A sharp kink needs many bisections; 45 evaluations is not enough.
        let budget = EvalBudget::new(45);
        let err = gauss_kronrod(ok(|x| (x - 0.123_456).abs().sqrt()), 0.0, 1.0, TIGHT, &budget).unwrap_err();
        match err {
            AttenuationError::IntegrationFailure { evaluations, .. } => assert!(evaluations <= 45),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reversed_or_nan_bounds_are_rejected() {
        let budget = EvalBudget::new(100);
        assert!(matches!(
            gauss_kronrod(ok(|x| x), 2.0, 1.0, TIGHT, &budget),
            Err(AttenuationError::InvalidParameters(_))
        ));
        assert!(matches!(
            gauss_kronrod(ok(|x| x), f64::NAN, 1.0, TIGHT, &budget),
            Err(AttenuationError::InvalidParameters(_))
        ));
    }

    #[test]
    fn integrand_errors_propagate() {
        let budget = EvalBudget::new(100);
        let err = gauss_kronrod(
            |_| Err(AttenuationError::InvalidConfig("inner".into())),
            0.0,
            1.0,
            TIGHT,
            &budget,
        )
        .unwrap_err();
        assert_eq!(err, AttenuationError::InvalidConfig("inner".into()));
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let f = |x: f64| (3.0 * x).sin() * (-x * x / 2.0).exp();
        let a = gauss_kronrod(ok(f), -1.0, f64::INFINITY, TIGHT, &EvalBudget::new(100_000)).unwrap();
        let b = gauss_kronrod(ok(f), -1.0, f64::INFINITY, TIGHT, &EvalBudget::new(100_000)).unwrap();
        assert_eq!(a.value.to_bits(), b.value.to_bits());
    }
}
