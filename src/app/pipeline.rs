//! Shared "scenario pipeline" used by `yw run` and the integration tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! calendar -> history merge -> selection -> levels -> events -> (monthly) ->
//! dispatch + forecast -> forecast curve fit -> comparison with the current curve
//!
//! The CLI can then focus on presentation (printing and exports).

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::calendar::UsFederalCalendar;
use crate::domain::{Frequency, ModelType, RunConfig};
use crate::error::AppError;
use crate::fit::{ExplainThresholds, compare_and_explain, fit};
use crate::io::curve::{CurveFile, CurveSection};
use crate::io::scenario::{Scenario, load_scenario};
use crate::models::{ArtifactStore, ForecastSeries, forecast_all, model_type_for};
use crate::session::WizardSession;
use crate::table::FeatureTable;
use crate::table::resample::{month_row, to_monthly};
use crate::table::schema::ColumnDelta;

/// All computed outputs of a single scenario run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub scenario: Scenario,
    /// Table handed to the forecasters (monthly when requested).
    pub table: FeatureTable,
    pub model_type: ModelType,
    pub delta: ColumnDelta,
    pub history_loaded: bool,
    pub events_recorded: usize,
    pub forecasts: Vec<ForecastSeries>,
    pub target: NaiveDate,
    /// Table row the forecast curve was read from (the target's month in monthly mode).
    pub row_date: NaiveDate,
    pub curve: CurveFile,
}

/// Load the scenario named by `config` and run it against `store`.
pub fn run_config(config: &RunConfig, store: &dyn ArtifactStore) -> Result<RunOutput, AppError> {
    let scenario = load_scenario(&config.scenario_path)?;
    run_scenario(scenario, config.frequency, store)
}

/// Build the feature table for `scenario` through the wizard steps.
pub fn build_table(scenario: &Scenario) -> Result<(FeatureTable, ColumnDelta, bool, usize), AppError> {
    let mut session = WizardSession::new().with_zero_means_missing(scenario.zero_means_missing);
    session.initialize(scenario.start(), scenario.end_date, &UsFederalCalendar)?;

    let history_loaded = match &scenario.history_csv {
        Some(path) => session.load_history_lenient(path)?,
        None => false,
    };

    let delta = session.select(scenario.selection())?;
    for level in &scenario.levels {
        session.apply_levels(level)?;
    }
    let events_recorded = session.record_events(&scenario.events)?;
    session.apply_events()?;

    Ok((session.into_table()?, delta, history_loaded, events_recorded))
}

/// Execute the full pipeline for an in-memory scenario.
pub fn run_scenario(
    scenario: Scenario,
    frequency: Frequency,
    store: &dyn ArtifactStore,
) -> Result<RunOutput, AppError> {
    let (daily, delta, history_loaded, events_recorded) = build_table(&scenario)?;
    let table = match frequency {
        Frequency::Daily => daily,
        Frequency::Monthly => to_monthly(&daily)?,
    };

    let model_type = model_type_for(&table)?;
    let forecasts = forecast_all(store, &table)?;

    let target = match scenario.target_date.or_else(|| table.last_date()) {
        Some(d) => d,
        None => return Err(AppError::precondition("Feature table has no rows to forecast.")),
    };
    let row_date = match frequency {
        Frequency::Daily => target,
        Frequency::Monthly => month_row(table.dates(), target).unwrap_or(target),
    };
    debug!(%target, %row_date, "forecast row resolved");
    let maturities: Vec<f64> = forecasts.iter().map(|s| f64::from(s.maturity.years())).collect();
    let yields = forecasts
        .iter()
        .map(|s| s.at(row_date).map(|p| p.mean))
        .collect::<Result<Vec<f64>, AppError>>()?;

    let forecast_fit = fit(&maturities, &yields)?;
    info!(%target, mse = forecast_fit.mse, "forecast curve fitted");
    let forecast = CurveSection::from_fit(&maturities, &yields, &forecast_fit);

    let (current, explanations) = match &scenario.current_curve {
        Some(obs) => {
            let current_fit = fit(&obs.maturities, &obs.yields)?;
            info!(mse = current_fit.mse, "current curve fitted");
            let lines = compare_and_explain(
                &current_fit.params,
                &forecast_fit.params,
                &ExplainThresholds::default(),
            );
            (
                Some(CurveSection::from_fit(&obs.maturities, &obs.yields, &current_fit)),
                lines,
            )
        }
        None => (None, Vec::new()),
    };

    let curve = CurveFile {
        tool: format!("yw {}", env!("CARGO_PKG_VERSION")),
        as_of: target,
        model_type,
        forecast,
        current,
        explanations,
    };

    Ok(RunOutput {
        scenario,
        table,
        model_type,
        delta,
        history_loaded,
        events_recorded,
        forecasts,
        target,
        row_date,
        curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{demo_scenario, demo_store};
    use crate::domain::Maturity;
    use crate::error::ErrorKind;
    use crate::models::MemoryStore;

    #[test]
    fn demo_scenario_runs_daily_and_monthly() {
        let store = demo_store(42).unwrap();

        let daily = run_scenario(demo_scenario().unwrap(), Frequency::Daily, &store).unwrap();
        assert_eq!(daily.model_type, ModelType::All);
        assert_eq!(daily.forecasts.len(), Maturity::ALL.len());
        assert_eq!(daily.events_recorded, 3);
        assert_eq!(daily.target, NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
        assert!(daily.curve.current.is_some());
        assert!(!daily.curve.explanations.is_empty());
        assert!(daily.curve.forecast.mse.is_finite());

        let monthly = run_scenario(demo_scenario().unwrap(), Frequency::Monthly, &store).unwrap();
        assert_eq!(monthly.table.len(), 13);
        assert_eq!(monthly.target, daily.target);
    }

    #[test]
    fn missing_artifacts_are_dispatch_errors() {
        let err = run_scenario(demo_scenario().unwrap(), Frequency::Daily, &MemoryStore::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dispatch);
    }

    #[test]
    fn target_before_the_table_is_an_input_error() {
        let mut s = demo_scenario().unwrap();
        s.target_date = NaiveDate::from_ymd_opt(2025, 1, 2);
        let err = run_scenario(s, Frequency::Daily, &demo_store(1).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn monthly_target_reads_its_own_month() {
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let mut s = demo_scenario().unwrap();
        s.target_date = Some(ymd(2025, 3, 25));
        let run = run_scenario(s, Frequency::Monthly, &demo_store(42).unwrap()).unwrap();
        assert_eq!(run.target, ymd(2025, 3, 25));
        assert_eq!(run.row_date, ymd(2025, 3, 31));
        assert_eq!(run.table.dates()[0], run.row_date);
        for (series, y) in run.forecasts.iter().zip(&run.curve.forecast.yields) {
            assert_eq!(series.path.mean[0], *y);
        }

        let mut s = demo_scenario().unwrap();
        s.target_date = Some(ymd(2025, 4, 15));
        let run = run_scenario(s, Frequency::Monthly, &demo_store(42).unwrap()).unwrap();
        assert_eq!(run.row_date, ymd(2025, 4, 30));
    }
}
