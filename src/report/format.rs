//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the numerical code stays clean and testable
//! - output changes are localized

use crate::domain::{AttenuationResult, BivariateNormalParams, CategoryScheme, Region};
use crate::report::Comparison;
use crate::simulate::SimulationOutcome;

/// Format a single integral evaluation.
pub fn format_integral(region: &Region, params: &BivariateNormalParams, value: f64) -> String {
    let mut out = String::new();
    out.push_str("=== E(X·Y) over region ===\n");
    out.push_str(&format!(
        "x: [{}, {}]  y: [{}, {}]\n",
        fmt_bound(region.x.lo),
        fmt_bound(region.x.hi),
        fmt_bound(region.y.lo),
        fmt_bound(region.y.hi)
    ));
    out.push_str(&format!(
        "mean=({}, {}) sd=({}, {}) rho={}\n",
        params.mean_x, params.mean_y, params.sd_x, params.sd_y, params.rho
    ));
    out.push_str(&format!("integral: {value:.10}\n"));
    out
}

/// Format the category scheme table (bounds, probability, label).
pub fn format_scheme(scheme: &CategoryScheme) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<8} {:>10} {:>10} {:>10} {:>8}", "category", "lower", "upper", "prob", "label").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<10} {:-<10} {:-<10} {:-<8}", "", "", "", "", "").trim_end());
    out.push('\n');
    for i in 0..scheme.category_count() {
        let (lo, hi) = scheme.bounds(i);
        out.push_str(
            format!(
                "{:<8} {:>10} {:>10} {:>10.4} {:>8}",
                i,
                fmt_bound(lo),
                fmt_bound(hi),
                scheme.probabilities()[i],
                fmt_label(scheme.labels()[i]),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Format an analytic attenuation result with its scheme.
pub fn format_attenuation(scheme: &CategoryScheme, result: &AttenuationResult) -> String {
    let mut out = String::new();
    out.push_str("=== Correlation attenuation (analytic) ===\n");
    out.push_str(&format_scheme(scheme));
    out.push('\n');
    out.push_str(&format!("E(Y) = {:.6}  Var(Y) = {:.6}\n", scheme.label_mean(), result.label_variance));
    out.push_str(&format!("latent correlation     : {:.6}\n", result.latent_correlation));
    out.push_str(&format!("attenuation factor     : {:.6}\n", result.attenuation_factor));
    out.push_str(&format!("attenuated correlation : {:.6}\n", result.attenuated_correlation));
    out
}

/// Format a Monte Carlo run.
pub fn format_simulation(outcome: &SimulationOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Correlation attenuation (Monte Carlo, n={}, seed={}) ===\n",
        outcome.samples, outcome.seed
    ));
    out.push_str(format!("{:<8} {:>10} {:>10}", "category", "count", "share").trim_end());
    out.push('\n');
    let n = outcome.samples.max(1) as f64;
    for (i, count) in outcome.category_counts.iter().enumerate() {
        out.push_str(&format!("{:<8} {:>10} {:>10.4}\n", i, count, *count as f64 / n));
    }
    out.push('\n');
    out.push_str(&format!("r(X, Y*) : {:.6}\n", outcome.latent_correlation));
    out.push_str(&format!("r(X, Y)  : {:.6}\n", outcome.observed_correlation));
    out.push_str(&format!("factor   : {}\n", fmt_opt(outcome.attenuation_factor)));
    out
}

/// Format the analytic vs simulated table.
pub fn format_comparison(cmp: &Comparison) -> String {
    let mut out = String::new();
    out.push_str("=== Analytic vs simulated ===\n");
    out.push_str(&format!(
        "cuts (z): {}  labels: {}  probs: {}\n",
        fmt_vec(&cmp.thresholds),
        fmt_vec(&cmp.labels),
        fmt_vec(&cmp.probabilities)
    ));
    out.push_str(&format!("Monte Carlo: n={} seed={}\n\n", cmp.simulated.samples, cmp.simulated.seed));

    out.push_str(format!("{:<24} {:>10} {:>10} {:>10}", "quantity", "analytic", "simulated", "|diff|").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<10} {:-<10} {:-<10}", "", "", "", "").trim_end());
    out.push('\n');
    for row in cmp.rows() {
        out.push_str(
            format!(
                "{:<24} {:>10.4} {:>10} {:>10}",
                row.quantity,
                row.analytic,
                fmt_opt(row.simulated),
                fmt_opt(row.abs_diff()),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_bound(v: f64) -> String {
    if v == f64::INFINITY {
        "Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{v:.4}")
    }
}

fn fmt_label(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|&x| fmt_bound(x)).collect();
    format!("[{}]", parts.join(", "))
}
