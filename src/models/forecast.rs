//! Forecaster interface and forecast retrieval over a feature table.

use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Maturity, ModelType, catalog};
use crate::error::AppError;
use crate::table::FeatureTable;

/// Mean path with lower/upper interval bounds, one entry per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastPath {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl ForecastPath {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Check the path has `horizon` finite, ordered entries.
    pub fn validate(&self, horizon: usize) -> Result<(), AppError> {
        if self.mean.len() != horizon || self.lower.len() != horizon || self.upper.len() != horizon {
            return Err(AppError::numerical(format!(
                "Forecaster returned {} steps for a horizon of {horizon}.",
                self.mean.len()
            )));
        }
        for i in 0..horizon {
            let (lo, m, hi) = (self.lower[i], self.mean[i], self.upper[i]);
            if !(lo.is_finite() && m.is_finite() && hi.is_finite()) {
                return Err(AppError::numerical(format!("Forecast step {} is not finite.", i + 1)));
            }
            if lo > m || m > hi {
                return Err(AppError::numerical(format!(
                    "Forecast step {} has an inverted interval ({lo} / {m} / {hi}).",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

/// A pre-trained forecaster: training column order plus a forecast function.
pub trait Forecaster {
    /// Exogenous columns in the order the model was trained with.
    fn exog_columns(&self) -> &[String];

    /// Forecast `horizon` steps given one exogenous row per step.
    fn forecast(&self, exog: &DMatrix<f64>, horizon: usize) -> Result<ForecastPath, AppError>;
}

/// Resolves artifact names to forecasters.
pub trait ArtifactStore {
    fn load(&self, name: &str) -> Result<Box<dyn Forecaster>, AppError>;
}

/// Map each training column to its source in `actual`.
///
/// `Some(i)` reads table column `i`; `None` is a catalog tariff feature the
/// user did not select, fed as zeros. Any other missing column, any table
/// column the forecaster was not trained on, and present columns out of
/// training order are dispatch errors.
pub fn align_columns(expected: &[String], actual: &[&str]) -> Result<Vec<Option<usize>>, AppError> {
    let mut plan = Vec::with_capacity(expected.len());
    let mut missing: Vec<&str> = Vec::new();
    for e in expected {
        match actual.iter().position(|a| a == e) {
            Some(i) => plan.push(Some(i)),
            None if catalog::is_tariff_feature(e) => plan.push(None),
            None => missing.push(e),
        }
    }
    let extra: Vec<&str> = actual
        .iter()
        .copied()
        .filter(|a| !expected.iter().any(|e| e == a))
        .collect();

    let in_order = plan.iter().flatten().is_sorted_by(|a, b| a < b);
    if missing.is_empty() && extra.is_empty() && in_order {
        return Ok(plan);
    }
    let detail = if missing.is_empty() && extra.is_empty() {
        "same columns in a different order".to_string()
    } else {
        format!("missing [{}], unexpected [{}]", missing.join(", "), extra.join(", "))
    };
    Err(AppError::dispatch(format!(
        "Feature table columns do not match the forecaster ({detail}).\n  expected: {}\n  actual:   {}",
        expected.join(", "),
        actual.join(", ")
    )))
}

/// Forecast over the whole table: horizon is the number of rows and the
/// exogenous matrix follows the forecaster's training column order.
pub fn forecast(handle: &dyn Forecaster, table: &FeatureTable) -> Result<ForecastPath, AppError> {
    let plan = align_columns(handle.exog_columns(), &table.column_names())?;
    let filled = plan.iter().filter(|p| p.is_none()).count();
    if filled > 0 {
        debug!(columns = filled, "unselected tariff features fed as zeros");
    }
    let exog = table.exog_matrix_for(&plan)?;
    let horizon = table.len();
    let path = handle.forecast(&exog, horizon)?;
    path.validate(horizon)?;
    Ok(path)
}

/// Row index used for `target`: the last row on or before it.
pub fn row_for_date(dates: &[NaiveDate], target: NaiveDate) -> Result<usize, AppError> {
    match (dates.first(), dates.last()) {
        (Some(&first), Some(&last)) if target >= first && target <= last => {
            Ok(dates.partition_point(|d| *d <= target) - 1)
        }
        (Some(first), Some(last)) => Err(AppError::input(format!(
            "Target date {target} is outside the forecast horizon [{first}, {last}]."
        ))),
        _ => Err(AppError::precondition("Forecast horizon is empty.")),
    }
}

/// Mean forecast at `target`.
pub fn forecast_at(handle: &dyn Forecaster, table: &FeatureTable, target: NaiveDate) -> Result<f64, AppError> {
    let i = row_for_date(table.dates(), target)?;
    let path = forecast(handle, table)?;
    Ok(path.mean[i])
}

/// A single dated forecast value with its interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// A forecast path labelled with its dispatch key and dates.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub maturity: Maturity,
    pub model_type: ModelType,
    pub artifact: String,
    pub dates: Vec<NaiveDate>,
    pub path: ForecastPath,
}

impl ForecastSeries {
    pub fn at(&self, target: NaiveDate) -> Result<ForecastPoint, AppError> {
        let i = row_for_date(&self.dates, target)?;
        Ok(ForecastPoint {
            date: self.dates[i],
            mean: self.path.mean[i],
            lower: self.path.lower[i],
            upper: self.path.upper[i],
        })
    }

    pub fn last(&self) -> Option<ForecastPoint> {
        let date = *self.dates.last()?;
        self.at(date).ok()
    }
}

pub(crate) fn log_series(series: &ForecastSeries) {
    if let Some(p) = series.last() {
        info!(
            maturity = series.maturity.years(),
            artifact = %series.artifact,
            steps = series.path.len(),
            last_mean = p.mean,
            "forecast computed"
        );
    }
}
