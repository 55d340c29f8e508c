//! Deterministic synthetic forecaster artifacts.
//!
//! Every (model type, maturity) pair gets an AR(1) ARIMAX description whose
//! exogenous columns match the full-catalog schema of that model type, so the
//! whole pipeline can run without trained artifacts.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::calendar::{UsFederalCalendar, business_days, default_start};
use crate::domain::catalog::{self, CATALOG};
use crate::domain::{Cadence, MacroSeries, Maturity, ModelType, SeriesTransform, VariableGroup};
use crate::error::AppError;
use crate::io::scenario::{ObservedCurve, Scenario, write_scenario};
use crate::models::arima::ArimaxArtifact;
use crate::models::dispatch::artifact_name;
use crate::models::store::MemoryStore;
use crate::table::events::TariffEvent;
use crate::table::levels::{LevelInput, SeriesInput, checkpoints};
use crate::table::schema::{Selection, ordered_columns};

/// File name of the scenario written next to the demo artifacts.
pub const DEMO_SCENARIO_FILE: &str = "scenario.json";

/// AR coefficient shared by every demo artifact.
const DEMO_PHI: f64 = 0.92;

/// Smooth upward-sloping base curve, in percent.
fn base_yield(maturity: Maturity) -> f64 {
    let t = f64::from(maturity.years());
    3.6 + 1.1 * (1.0 - (-t / 6.0).exp())
}

fn coef_scale(column: &str) -> f64 {
    if catalog::is_tariff_column(column) {
        return 0.004;
    }
    let transform = [
        MacroSeries::Ffr,
        MacroSeries::Cpi,
        MacroSeries::Vix,
        MacroSeries::ConsumerSentiment,
        MacroSeries::M1Supply,
    ]
    .into_iter()
    .find(|s| s.column() == column)
    .map(MacroSeries::transform);
    match transform {
        Some(SeriesTransform::Level) => 0.0004,
        Some(SeriesTransform::Delta) => 0.03,
        None => 0.0,
    }
}

fn demo_artifact(
    model_type: ModelType,
    maturity: Maturity,
    rng: &mut StdRng,
    normal: &Normal<f64>,
) -> ArimaxArtifact {
    let selection = Selection {
        groups: model_type.groups().into_iter().collect(),
        tariffs: CATALOG.iter().map(|c| c.id.to_string()).collect(),
    };
    let exog_columns = ordered_columns(&selection);
    let exog_coefs = exog_columns
        .iter()
        .map(|c| coef_scale(c) * normal.sample(rng))
        .collect();

    let base = base_yield(maturity);
    let history = (0..5).map(|_| base + 0.05 * normal.sample(rng)).collect();
    ArimaxArtifact {
        intercept: base * (1.0 - DEMO_PHI),
        ar: vec![DEMO_PHI],
        d: 0,
        exog_columns,
        exog_coefs,
        sigma: 0.01 * f64::from(maturity.years()).sqrt(),
        history,
        alpha: 0.2,
    }
}

/// All 48 demo artifacts keyed by artifact file name.
pub fn demo_artifacts(seed: u64) -> Result<BTreeMap<String, ArimaxArtifact>, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::numerical(format!("Noise distribution error: {e}")))?;

    let mut out = BTreeMap::new();
    for model_type in ModelType::ALL {
        for maturity in Maturity::ALL {
            let artifact = demo_artifact(model_type, maturity, &mut rng, &normal);
            out.insert(artifact_name(model_type, maturity), artifact);
        }
    }
    Ok(out)
}

pub fn demo_store(seed: u64) -> Result<MemoryStore, AppError> {
    let mut store = MemoryStore::new();
    for (name, artifact) in demo_artifacts(seed)? {
        store.insert(name, artifact);
    }
    Ok(store)
}

/// A one-year scenario using every group, every tariff and a few events.
pub fn demo_scenario() -> Result<Scenario, AppError> {
    let start = default_start();
    let end = NaiveDate::from_ymd_opt(2026, 3, 20)
        .ok_or_else(|| AppError::input("Invalid demo end date."))?;
    let days = business_days(start, end, &UsFederalCalendar);
    let points = checkpoints(&days, Cadence::ThreeMonths);

    let path = |baseline: f64, step: f64| SeriesInput {
        baseline,
        values: points
            .iter()
            .enumerate()
            .map(|(i, d)| (*d, Some(baseline + step * i as f64)))
            .collect(),
    };
    let level = |group: VariableGroup, series: Vec<(MacroSeries, SeriesInput)>| LevelInput {
        group,
        cadence: Cadence::ThreeMonths,
        window_start: None,
        series: series.into_iter().collect(),
    };

    let levels = vec![
        level(
            VariableGroup::InflationFfr,
            vec![(MacroSeries::Ffr, path(4.33, -0.25)), (MacroSeries::Cpi, path(319.8, 0.9))],
        ),
        level(
            VariableGroup::SentimentVix,
            vec![
                (MacroSeries::Vix, path(19.3, 0.6)),
                (MacroSeries::ConsumerSentiment, path(57.0, -0.8)),
            ],
        ),
        level(VariableGroup::M1Supply, vec![(MacroSeries::M1Supply, path(18_300.0, 45.0))]),
    ];

    let event = |category: &str, y: i32, m: u32, d: u32| -> Result<TariffEvent, AppError> {
        let date = NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| AppError::input(format!("Invalid demo event date {y}-{m}-{d}.")))?;
        Ok(TariffEvent {
            category: category.to_string(),
            date,
        })
    };
    let events = vec![
        event("start_tariff_72", 2025, 4, 2)?,
        event("start_tariff_76", 2025, 6, 4)?,
        event("start_tariff_87", 2025, 8, 1)?,
    ];

    Ok(Scenario {
        start_date: Some(start),
        end_date: end,
        history_csv: None,
        variables: VariableGroup::ALL.into_iter().collect(),
        tariffs: CATALOG.iter().map(|c| c.id.to_string()).collect(),
        levels,
        events,
        current_curve: Some(ObservedCurve {
            maturities: Maturity::ALL.iter().map(|m| f64::from(m.years())).collect(),
            yields: vec![3.95, 3.92, 4.01, 4.15, 4.31, 4.72],
        }),
        target_date: None,
        zero_means_missing: false,
    })
}

/// Write every demo artifact plus `scenario.json` into `dir`.
pub fn write_demo(dir: &Path, seed: u64) -> Result<usize, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", dir.display())))?;

    let artifacts = demo_artifacts(seed)?;
    for (name, artifact) in &artifacts {
        let path = dir.join(name);
        let file = File::create(&path)
            .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(BufWriter::new(file), artifact)
            .map_err(|e| AppError::input(format!("Failed to write artifact '{name}': {e}")))?;
    }

    write_scenario(&dir.join(DEMO_SCENARIO_FILE), &demo_scenario()?)?;
    info!(dir = %dir.display(), artifacts = artifacts.len(), seed, "demo data written");
    Ok(artifacts.len())
}
