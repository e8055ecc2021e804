//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds category schemes and configs from flags
//! - runs the integrator, calculator or simulator
//! - prints reports and writes optional exports

use clap::Parser;
use log::debug;

use crate::cli::{
    AttenuateArgs, Command, CompareArgs, IntegrateArgs, QuadratureArgs, SchemeArgs, ShowArgs,
    SimulateArgs, SimulationArgs,
};
use crate::domain::{
    BivariateNormalParams, CategoryScheme, Interval, QuadratureConfig, Region, SimulationConfig,
};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `attenuate` binary.
pub fn run() -> Result<(), AppError> {
    // `attenuate` on its own (or with only scheme flags) runs `compare`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Integrate(args) => handle_integrate(args),
        Command::Attenuate(args) => handle_attenuate(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Compare(args) => handle_compare(args),
        Command::Show(args) => handle_show(args),
    }
}

/// Initialize `env_logger`; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn handle_integrate(args: IntegrateArgs) -> Result<(), AppError> {
    let params = BivariateNormalParams {
        mean_x: args.mean_x,
        mean_y: args.mean_y,
        sd_x: args.sd_x,
        sd_y: args.sd_y,
        rho: args.rho,
    };
    let region = Region::new(Interval::new(args.x_lo, args.x_hi), Interval::new(args.y_lo, args.y_hi));
    let config = quadrature_config_from_args(&args.quadrature);

    let value = crate::integrate::integrate_bivariate_tail(region, params, Some(config))?;
    println!("{}", crate::report::format_integral(&region, &params, value));
    Ok(())
}

fn handle_attenuate(args: AttenuateArgs) -> Result<(), AppError> {
    let scheme = scheme_from_args(&args.scheme)?;
    let config = quadrature_config_from_args(&args.quadrature);

    let result = crate::attenuation::compute_attenuation_with(args.scheme.rho, &scheme, &config)?;
    println!("{}", crate::report::format_attenuation(&scheme, &result));

    if let Some(path) = &args.json {
        crate::io::write_json(path, &result)?;
    }
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let scheme = scheme_from_args(&args.scheme)?;
    let params = params_from_args(&args.scheme);
    let config = simulation_config_from_args(&args.simulation);

    let outcome = crate::simulate::simulate_attenuation(params, &scheme, &config)?;
    println!("{}", crate::report::format_scheme(&scheme));
    println!("{}", crate::report::format_simulation(&outcome));

    if let Some(path) = &args.json {
        crate::io::write_json(path, &outcome)?;
    }
    Ok(())
}

fn handle_compare(args: CompareArgs) -> Result<(), AppError> {
    let scheme = scheme_from_args(&args.scheme)?;
    let params = params_from_args(&args.scheme);
    let quadrature = quadrature_config_from_args(&args.quadrature);
    let simulation = simulation_config_from_args(&args.simulation);

    let cmp = pipeline::run_comparison(params, &scheme, &quadrature, &simulation)?;
    println!("{}", crate::report::format_comparison(&cmp));

    if let Some(path) = &args.json {
        crate::io::write_json(path, &cmp)?;
    }
    if let Some(path) = &args.csv {
        crate::io::write_comparison_csv(path, &cmp)?;
    }
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let cmp: crate::report::Comparison = crate::io::read_json(&args.path)?;
    println!("{}", crate::report::format_comparison(&cmp));
    Ok(())
}

pub fn quadrature_config_from_args(args: &QuadratureArgs) -> QuadratureConfig {
    QuadratureConfig {
        abs_tol: args.abs_tol,
        rel_tol: args.rel_tol,
        max_evals: args.max_evals,
        strategy: args.strategy,
    }
}

pub fn simulation_config_from_args(args: &SimulationArgs) -> SimulationConfig {
    SimulationConfig {
        samples: args.samples,
        seed: args.seed,
    }
}

/// Standard `X` with `Y*` on the raw scale given by `--mean` / `--sd`.
pub fn params_from_args(args: &SchemeArgs) -> BivariateNormalParams {
    BivariateNormalParams {
        mean_x: 0.0,
        mean_y: args.mean,
        sd_x: 1.0,
        sd_y: args.sd,
        rho: args.rho,
    }
}

/// Build the category scheme from `--probs` or `--thresholds`.
///
/// With neither flag the scheme is a single cut at the 30th percentile.
/// Labels default to `0, 1, …, k-1`.
pub fn scheme_from_args(args: &SchemeArgs) -> Result<CategoryScheme, AppError> {
    let cut_count = if !args.thresholds.is_empty() {
        args.thresholds.len()
    } else if !args.probs.is_empty() {
        args.probs.len()
    } else {
        1
    };
    let labels = if args.labels.is_empty() {
        CategoryScheme::ordinal_labels(cut_count)
    } else {
        args.labels.clone()
    };

    let scheme = if !args.thresholds.is_empty() {
        CategoryScheme::from_raw(&args.thresholds, labels, args.mean, args.sd)?
    } else if !args.probs.is_empty() {
        CategoryScheme::from_cumulative_probs(&args.probs, labels)?
    } else {
        CategoryScheme::from_cumulative_probs(&[0.3], labels)?
    };
    debug!("scheme: thresholds={:?} labels={:?}", scheme.thresholds(), scheme.labels());
    Ok(scheme)
}

/// Rewrite argv so `attenuate` defaults to `attenuate compare`.
///
/// Rules:
/// - `attenuate`                       -> `attenuate compare`
/// - `attenuate --probs 0.3 ...`       -> `attenuate compare --probs 0.3 ...`
/// - `attenuate --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("compare".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "integrate" | "attenuate" | "simulate" | "compare" | "show"
    );
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "compare".to_string());
        return argv;
    }

    argv
}
