//! Command-line parsing for the yield forecast wizard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the table/forecast/fit code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Frequency, VariableGroup};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "yw", version, about = "Scenario-driven Treasury yield forecasts with AFNS curve fits")]
pub struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a scenario file end to end: table, forecasts, curve fit, explanation.
    Run(RunArgs),
    /// Print the business-day calendar for a date range.
    Calendar(CalendarArgs),
    /// Print the canonical column order for a selection.
    Columns(SelectionArgs),
    /// Print the artifact names a selection dispatches to.
    Dispatch(DispatchArgs),
    /// Fit an AFNS curve to observed yields.
    Fit(FitArgs),
    /// Fit two curves and explain how the second differs from the first.
    Explain(ExplainArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// List the tariff categories.
    Tariffs,
    /// Write synthetic artifacts and a demo scenario.
    Demo(DemoArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Scenario JSON file.
    #[arg(long, value_name = "JSON")]
    pub scenario: PathBuf,

    /// Artifact directory (falls back to YW_MODELS_DIR, then `models`).
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Use in-memory demo artifacts generated from this seed instead of a directory.
    #[arg(long, value_name = "SEED", conflicts_with = "models_dir")]
    pub demo_seed: Option<u64>,

    /// Row frequency handed to the forecasters.
    #[arg(long, value_enum, default_value_t = Frequency::Daily)]
    pub frequency: Frequency,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export every forecast path to CSV (long format).
    #[arg(long = "export-forecast")]
    pub export_forecast: Option<PathBuf>,

    /// Export the final feature table to CSV.
    #[arg(long = "export-table")]
    pub export_table: Option<PathBuf>,

    /// Export curve fits and explanation to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CalendarArgs {
    /// First day of the range.
    #[arg(long, default_value = "2025-03-21")]
    pub start: NaiveDate,

    /// Last day of the range (at most two years after the start).
    #[arg(long)]
    pub end: NaiveDate,

    /// Print every business day, not just the summary.
    #[arg(long)]
    pub list: bool,

    /// Also print the cadences available for the range.
    #[arg(long)]
    pub cadences: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SelectionArgs {
    /// Variable groups to include.
    #[arg(long = "group", value_enum)]
    pub groups: Vec<VariableGroup>,

    /// Tariff identifiers to include (e.g. start_tariff_72).
    #[arg(long = "tariff")]
    pub tariffs: Vec<String>,

    /// Include every tariff in the catalog.
    #[arg(long)]
    pub all_tariffs: bool,
}

#[derive(Debug, Args, Clone)]
pub struct DispatchArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Only this maturity in years (2, 3, 5, 7, 10 or 20).
    #[arg(long)]
    pub maturity: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Maturities in years, comma-separated.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub maturities: Vec<f64>,

    /// Observed yields in percent, comma-separated.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub yields: Vec<f64>,

    /// Export the fit to curve JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ExplainArgs {
    /// Maturities in years, comma-separated.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub maturities: Vec<f64>,

    /// Current yields, comma-separated.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub current: Vec<f64>,

    /// Forecast yields, comma-separated.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub forecast: Vec<f64>,

    /// Change threshold applied to every factor.
    #[arg(long, default_value_t = 0.05)]
    pub threshold: f64,
}

/// Options for plotting a saved curve.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Curve JSON file produced by `yw run --export-curve` or `yw fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Output directory for artifacts and scenario.json.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Seed for the synthetic coefficients.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_exports() {
        let cli = Cli::try_parse_from([
            "yw",
            "run",
            "--scenario",
            "s.json",
            "--frequency",
            "monthly",
            "--export-curve",
            "c.json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.frequency, Frequency::Monthly);
        assert_eq!(args.export_curve, Some(PathBuf::from("c.json")));
        assert!(args.models_dir.is_none());
    }

    #[test]
    fn parses_comma_separated_yields() {
        let cli = Cli::try_parse_from(["yw", "fit", "--maturities", "2,5,10", "--yields", "3.9,4.0,4.2"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.maturities, vec![2.0, 5.0, 10.0]);
        assert_eq!(args.yields.len(), 3);
    }

    #[test]
    fn parses_group_selection() {
        let cli = Cli::try_parse_from([
            "yw",
            "dispatch",
            "--group",
            "inflation-ffr",
            "--tariff",
            "start_tariff_72",
            "--maturity",
            "10",
        ])
        .unwrap();
        let Command::Dispatch(args) = cli.command else {
            panic!("expected dispatch");
        };
        assert_eq!(args.selection.groups, vec![VariableGroup::InflationFfr]);
        assert_eq!(args.maturity, Some(10));
    }

    #[test]
    fn demo_seed_conflicts_with_models_dir() {
        let r = Cli::try_parse_from(["yw", "run", "--scenario", "s.json", "--models-dir", "m", "--demo-seed", "1"]);
        assert!(r.is_err());
    }
}
