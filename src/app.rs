//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the tracing subscriber
//! - parses CLI arguments
//! - runs the scenario pipeline or one of the single-step commands
//! - prints reports/plots and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::calendar::{BusinessCalendar, UsFederalCalendar};
use crate::cli::{
    CalendarArgs, Cli, Command, DemoArgs, DispatchArgs, ExplainArgs, FitArgs, PlotArgs, RunArgs,
    SelectionArgs,
};
use crate::domain::catalog::CATALOG;
use crate::domain::{Maturity, ModelType, RunConfig};
use crate::error::AppError;
use crate::fit::{ExplainThresholds, compare_and_explain, fit};
use crate::io::curve::{CurveFile, CurveSection};
use crate::models::{ArtifactStore, DirectoryStore, artifact_name};
use crate::table::FeatureTable;
use crate::table::levels::available_cadences;
use crate::table::schema::{Selection, select_columns};

pub mod pipeline;

/// Entry point for the `yw` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Calendar(args) => handle_calendar(args),
        Command::Columns(args) => handle_columns(args),
        Command::Dispatch(args) => handle_dispatch(args),
        Command::Fit(args) => handle_fit(args),
        Command::Explain(args) => handle_explain(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tariffs => {
            print!("{}", crate::report::format_tariff_catalog());
            Ok(())
        }
        Command::Demo(args) => handle_demo(args),
    }
}

/// Logs go to stderr; `--verbose` wins over `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("yield_wizard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yield_wizard=info"))
    };
    // A second initialisation (tests, embedding) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    RunConfig {
        scenario_path: args.scenario.clone(),
        models_dir: DirectoryStore::resolve(args.models_dir.as_deref()).root().to_path_buf(),
        frequency: args.frequency,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_forecast: args.export_forecast.clone(),
        export_table: args.export_table.clone(),
        export_curve: args.export_curve.clone(),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let store: Box<dyn ArtifactStore> = match args.demo_seed {
        Some(seed) => Box::new(crate::data::demo_store(seed)?),
        None => Box::new(DirectoryStore::new(&config.models_dir)),
    };
    let run = pipeline::run_config(&config, store.as_ref())?;

    print!(
        "{}",
        crate::report::format_run_summary(&run.table, run.model_type, config.frequency, run.history_loaded)
    );
    println!("{}", crate::report::format_forecasts(&run.forecasts, Some(run.row_date))?);
    println!("{}", crate::report::format_curve(&run.curve));

    if config.plot {
        let plot = crate::plot::render_curve_comparison(&run.curve, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_forecast {
        crate::io::export::write_forecast_csv(path, &run.forecasts)?;
        info!(path = %path.display(), "forecasts exported");
    }
    if let Some(path) = &config.export_table {
        crate::io::export::write_table_csv(path, &run.table)?;
        info!(path = %path.display(), "feature table exported");
    }
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &run.curve)?;
        info!(path = %path.display(), "curve exported");
    }

    Ok(())
}

fn handle_calendar(args: CalendarArgs) -> Result<(), AppError> {
    let calendar = BusinessCalendar::build(args.start, args.end, &UsFederalCalendar)?;
    print!("{}", crate::report::format_calendar(&calendar, args.list));
    if args.cadences {
        let names: Vec<&str> = available_cadences(calendar.days())
            .into_iter()
            .map(|c| c.display_name())
            .collect();
        println!("Cadences: {}", names.join(", "));
    }
    Ok(())
}

fn selection_from_args(args: &SelectionArgs) -> Result<Selection, AppError> {
    let selection = if args.all_tariffs {
        Selection::new(args.groups.iter().copied(), CATALOG.iter().map(|c| c.id))
    } else {
        Selection::new(args.groups.iter().copied(), args.tariffs.iter().cloned())
    };
    selection.validate()?;
    Ok(selection)
}

fn handle_columns(args: SelectionArgs) -> Result<(), AppError> {
    let selection = selection_from_args(&args)?;
    let calendar = BusinessCalendar::from_days(vec![crate::calendar::default_start()])?;
    let (table, delta) = select_columns(FeatureTable::from_calendar(&calendar)?, &selection)?;
    print!("{}", crate::report::format_columns(&table, Some(&delta)));
    Ok(())
}

fn handle_dispatch(args: DispatchArgs) -> Result<(), AppError> {
    let selection = selection_from_args(&args.selection)?;
    let model_type = ModelType::from_groups(&selection.groups);
    let maturities = match args.maturity {
        Some(years) => vec![Maturity::try_from(years)?],
        None => Maturity::ALL.to_vec(),
    };
    println!("Model type: {}", model_type.label());
    for m in maturities {
        println!("{:>3}y  {}", m.years(), artifact_name(model_type, m));
    }
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let out = fit(&args.maturities, &args.yields)?;
    let curve = CurveFile {
        tool: format!("yw {}", env!("CARGO_PKG_VERSION")),
        as_of: chrono::Local::now().date_naive(),
        model_type: ModelType::TariffsOnly,
        forecast: CurveSection::from_fit(&args.maturities, &args.yields, &out),
        current: None,
        explanations: Vec::new(),
    };
    print!("{}", crate::report::format_curve(&curve));
    println!("- iter : {}", out.iterations);

    if let Some(path) = &args.export_curve {
        crate::io::curve::write_curve_json(path, &curve)?;
    }
    Ok(())
}

fn handle_explain(args: ExplainArgs) -> Result<(), AppError> {
    let current = fit(&args.maturities, &args.current)?;
    let forecast = fit(&args.maturities, &args.forecast)?;
    let t = args.threshold;
    let thresholds = ExplainThresholds {
        level: t,
        slope: t,
        curvature: t,
        lambda: t,
    };
    let lines = compare_and_explain(&current.params, &forecast.params, &thresholds);
    print!("{}", crate::report::format_explanations(&lines));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_curve_comparison(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let n = crate::data::write_demo(&args.out, args.seed)?;
    println!(
        "Wrote {n} artifacts and {} to {}",
        crate::data::DEMO_SCENARIO_FILE,
        args.out.display()
    );
    Ok(())
}
