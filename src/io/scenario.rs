//! Scenario files: one JSON document describing a complete wizard run.
//!
//! ```json
//! {
//!   "end_date": "2026-03-20",
//!   "history_csv": "filtered.csv",
//!   "variables": ["inflation_ffr", "sentiment_vix"],
//!   "tariffs": ["start_tariff_72"],
//!   "levels": [{ "group": "inflation_ffr", "cadence": "three-months", "series": { ... } }],
//!   "events": [{ "category": "start_tariff_72", "date": "2025-04-02" }],
//!   "current_curve": { "maturities": [2, 3, 5, 7, 10, 20], "yields": [...] }
//! }
//! ```
//!
//! Relative `history_csv` paths are resolved against the scenario's directory.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::default_start;
use crate::domain::VariableGroup;
use crate::error::AppError;
use crate::table::events::TariffEvent;
use crate::table::levels::LevelInput;
use crate::table::schema::Selection;

/// An observed `(maturity, yield)` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedCurve {
    pub maturities: Vec<f64>,
    pub yields: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_csv: Option<PathBuf>,
    #[serde(default)]
    pub variables: BTreeSet<VariableGroup>,
    #[serde(default)]
    pub tariffs: BTreeSet<String>,
    #[serde(default)]
    pub levels: Vec<LevelInput>,
    #[serde(default)]
    pub events: Vec<TariffEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_curve: Option<ObservedCurve>,
    /// Date at which the forecast curve is read; defaults to the last business day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub zero_means_missing: bool,
}

impl Scenario {
    pub fn start(&self) -> NaiveDate {
        self.start_date.unwrap_or_else(default_start)
    }

    pub fn selection(&self) -> Selection {
        Selection {
            groups: self.variables.clone(),
            tariffs: self.tariffs.clone(),
        }
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open scenario '{}': {e}", path.display())))?;
    let mut scenario: Scenario = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid scenario JSON '{}': {e}", path.display())))?;

    if let Some(csv) = &scenario.history_csv {
        if csv.is_relative() {
            if let Some(dir) = path.parent() {
                scenario.history_csv = Some(dir.join(csv));
            }
        }
    }
    Ok(scenario)
}

pub fn write_scenario(path: &Path, scenario: &Scenario) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create scenario '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, scenario)
        .map_err(|e| AppError::input(format!("Failed to write scenario JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cadence, MacroSeries};

    #[test]
    fn parses_minimal_and_full_documents() {
        let minimal: Scenario = serde_json::from_str(r#"{"end_date":"2025-12-31"}"#).unwrap();
        assert_eq!(minimal.start(), default_start());
        assert!(minimal.selection().groups.is_empty());
        assert!(!minimal.zero_means_missing);

        let json = r#"{
            "end_date": "2025-12-31",
            "variables": ["m1_supply"],
            "tariffs": ["start_tariff_72"],
            "levels": [{
                "group": "m1_supply",
                "cadence": "six-months",
                "series": { "m1_supply": { "baseline": 18000.0,
                    "values": { "2025-03-21": 18050.0, "2025-09-22": null } } }
            }],
            "events": [{ "category": "start_tariff_72", "date": "2025-04-02" }],
            "zero_means_missing": true
        }"#;
        let s: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(s.levels[0].cadence, Cadence::SixMonths);
        let m1 = &s.levels[0].series[&MacroSeries::M1Supply];
        assert_eq!(m1.values.len(), 2);
        assert_eq!(m1.values.values().filter(|v| v.is_none()).count(), 1);
        assert_eq!(s.events.len(), 1);
    }

    #[test]
    fn relative_history_path_follows_scenario_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, r#"{"end_date":"2025-06-30","history_csv":"hist.csv"}"#).unwrap();
        let s = load_scenario(&path).unwrap();
        assert_eq!(s.history_csv, Some(dir.path().join("hist.csv")));
    }

    #[test]
    fn invalid_json_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        assert_eq!(load_scenario(&path).unwrap_err().exit_code(), 2);
    }
}
