//! Command-line parsing for the attenuation calculator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the numerical code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::Strategy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "attenuate",
    version,
    about = "Correlation attenuation from discretizing a latent normal variable"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Integrate x·y against a bivariate normal density over a rectangle.
    Integrate(IntegrateArgs),
    /// Compute the analytic attenuation factor for a category scheme.
    Attenuate(AttenuateArgs),
    /// Estimate the attenuation factor by Monte Carlo simulation.
    Simulate(SimulateArgs),
    /// Print analytic and simulated attenuation side by side.
    Compare(CompareArgs),
    /// Print a comparison saved with `compare --json`.
    Show(ShowArgs),
}

/// Quadrature tolerances and budget.
#[derive(Debug, Args, Clone)]
pub struct QuadratureArgs {
    /// Relative error target.
    #[arg(long, default_value_t = 1e-7)]
    pub rel_tol: f64,

    /// Absolute error target.
    #[arg(long, default_value_t = 1e-10)]
    pub abs_tol: f64,

    /// Maximum integrand evaluations per 2-D integral.
    #[arg(long, default_value_t = 2_000_000)]
    pub max_evals: usize,

    /// Integration strategy.
    #[arg(long, value_enum, default_value_t = Strategy::Conditional)]
    pub strategy: Strategy,
}

/// Latent correlation and the discretization of `Y*`.
#[derive(Debug, Args, Clone)]
pub struct SchemeArgs {
    /// Correlation between X and the latent Y*.
    #[arg(long, default_value_t = 0.5, allow_hyphen_values = true)]
    pub rho: f64,

    /// Cumulative cut probabilities, e.g. `0.5,0.8,0.9` (thresholds = qnorm(p)).
    #[arg(long, value_delimiter = ',', conflicts_with = "thresholds")]
    pub probs: Vec<f64>,

    /// Cut points in the raw units of Y* (see --mean / --sd).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub thresholds: Vec<f64>,

    /// Category labels (one more than the cut points). Defaults to 0, 1, …, k-1.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub labels: Vec<f64>,

    /// Mean of Y* in raw units (used to standardize --thresholds).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub mean: f64,

    /// Standard deviation of Y* in raw units (used to standardize --thresholds).
    #[arg(long, default_value_t = 1.0)]
    pub sd: f64,
}

/// Monte Carlo settings.
#[derive(Debug, Args, Clone)]
pub struct SimulationArgs {
    /// Number of simulated pairs.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub samples: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for `integrate`.
#[derive(Debug, Args, Clone)]
pub struct IntegrateArgs {
    #[arg(long, default_value = "-inf", allow_hyphen_values = true)]
    pub x_lo: f64,
    #[arg(long, default_value = "inf", allow_hyphen_values = true)]
    pub x_hi: f64,
    #[arg(long, default_value = "-inf", allow_hyphen_values = true)]
    pub y_lo: f64,
    #[arg(long, default_value = "inf", allow_hyphen_values = true)]
    pub y_hi: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub mean_x: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub mean_y: f64,
    #[arg(long, default_value_t = 1.0)]
    pub sd_x: f64,
    #[arg(long, default_value_t = 1.0)]
    pub sd_y: f64,
    #[arg(long, default_value_t = 0.5, allow_hyphen_values = true)]
    pub rho: f64,

    #[command(flatten)]
    pub quadrature: QuadratureArgs,
}

/// Options for `attenuate`.
#[derive(Debug, Args, Clone)]
pub struct AttenuateArgs {
    #[command(flatten)]
    pub scheme: SchemeArgs,

    #[command(flatten)]
    pub quadrature: QuadratureArgs,

    /// Write the result as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

/// Options for `simulate`.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub scheme: SchemeArgs,

    #[command(flatten)]
    pub simulation: SimulationArgs,

    /// Write the outcome as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

/// Options for `compare`.
#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub scheme: SchemeArgs,

    #[command(flatten)]
    pub quadrature: QuadratureArgs,

    #[command(flatten)]
    pub simulation: SimulationArgs,

    /// Write the comparison as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,

    /// Write the comparison rows as CSV.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,
}

/// Options for `show`.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Comparison JSON produced by `compare --json`.
    #[arg(value_name = "JSON")]
    pub path: PathBuf,
}
