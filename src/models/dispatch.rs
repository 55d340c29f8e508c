//! Model-type resolution and artifact dispatch.
//!
//! The set of macro-variable groups present in the feature table picks one of
//! eight model types; together with a maturity that names exactly one artifact:
//!
//! ```text
//! arima_model_{years}-year_monthly_tariff[_{suffix}].pkl
//! ```

use tracing::info;

use crate::domain::{Maturity, ModelType};
use crate::error::AppError;
use crate::models::forecast::{ArtifactStore, ForecastSeries, Forecaster, forecast, log_series};
use crate::table::FeatureTable;
use crate::table::schema::groups_present;

/// Artifact file name for a model type and maturity.
pub fn artifact_name(model_type: ModelType, maturity: Maturity) -> String {
    let years = maturity.years();
    match model_type.suffix() {
        Some(suffix) => format!("arima_model_{years}-year_monthly_tariff_{suffix}.pkl"),
        None => format!("arima_model_{years}-year_monthly_tariff.pkl"),
    }
}

/// Model type implied by the table's columns.
///
/// A group whose columns are only partly present maps to no artifact and is a
/// dispatch error.
pub fn model_type_for_columns(names: &[&str]) -> Result<ModelType, AppError> {
    let (full, partial) = groups_present(names);
    if let Some(g) = partial.first() {
        let missing: Vec<&str> = g.columns().into_iter().filter(|c| !names.contains(c)).collect();
        return Err(AppError::dispatch(format!(
            "{} is only partially present (missing {}); no forecaster matches this column set.",
            g.display_name(),
            missing.join(", ")
        )));
    }
    Ok(ModelType::from_groups(&full))
}

pub fn model_type_for(table: &FeatureTable) -> Result<ModelType, AppError> {
    model_type_for_columns(&table.column_names())
}

/// A loaded forecaster together with the key it was dispatched on.
pub struct ForecasterHandle {
    pub model_type: ModelType,
    pub maturity: Maturity,
    pub artifact: String,
    forecaster: Box<dyn Forecaster>,
}

impl ForecasterHandle {
    pub fn forecaster(&self) -> &dyn Forecaster {
        self.forecaster.as_ref()
    }
}

impl std::fmt::Debug for ForecasterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecasterHandle")
            .field("model_type", &self.model_type)
            .field("maturity", &self.maturity)
            .field("artifact", &self.artifact)
            .finish()
    }
}

/// Load the forecaster for `(model_type, maturity)`.
pub fn dispatch(
    store: &dyn ArtifactStore,
    model_type: ModelType,
    maturity: Maturity,
) -> Result<ForecasterHandle, AppError> {
    let artifact = artifact_name(model_type, maturity);
    let forecaster = store.load(&artifact)?;
    info!(model_type = model_type.label(), maturity = maturity.years(), %artifact, "forecaster dispatched");
    Ok(ForecasterHandle {
        model_type,
        maturity,
        artifact,
        forecaster,
    })
}

/// Dispatch and forecast one maturity over the whole table.
pub fn forecast_maturity(
    store: &dyn ArtifactStore,
    table: &FeatureTable,
    maturity: Maturity,
) -> Result<ForecastSeries, AppError> {
    let model_type = model_type_for(table)?;
    let handle = dispatch(store, model_type, maturity)?;
    let path = forecast(handle.forecaster(), table)?;
    let series = ForecastSeries {
        maturity,
        model_type,
        artifact: handle.artifact,
        dates: table.dates().to_vec(),
        path,
    };
    log_series(&series);
    Ok(series)
}

/// Forecast every supported maturity, shortest first.
pub fn forecast_all(store: &dyn ArtifactStore, table: &FeatureTable) -> Result<Vec<ForecastSeries>, AppError> {
    Maturity::ALL
        .into_iter()
        .map(|m| forecast_maturity(store, table, m))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_artifact_convention() {
        assert_eq!(
            artifact_name(ModelType::FfrCpiVixCs, Maturity::Y10),
            "arima_model_10-year_monthly_tariff_ffr_cpi_vix_cs.pkl"
        );
        assert_eq!(
            artifact_name(ModelType::TariffsOnly, Maturity::Y2),
            "arima_model_2-year_monthly_tariff.pkl"
        );
        assert_eq!(artifact_name(ModelType::All, Maturity::Y20), "arima_model_20-year_monthly_tariff_all.pkl");
    }

    #[test]
    fn every_model_type_and_maturity_has_a_unique_name() {
        let mut names = std::collections::HashSet::new();
        for t in ModelType::ALL {
            for m in Maturity::ALL {
                assert!(names.insert(artifact_name(t, m)));
            }
        }
        assert_eq!(names.len(), 48);
    }

    #[test]
    fn resolves_model_type_from_columns() {
        let cols = ["start_tariff_72", "diff_FFR", "diff_CPI", "VIX_close", "diff_CSD"];
        assert_eq!(model_type_for_columns(&cols).unwrap(), ModelType::FfrCpiVixCs);
        assert_eq!(model_type_for_columns(&["start_tariff_72"]).unwrap(), ModelType::TariffsOnly);

        let err = model_type_for_columns(&["diff_FFR", "diff_M1_supply"]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Dispatch);
        assert!(err.message().contains("diff_CPI"));
    }
}
