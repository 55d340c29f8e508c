//! Column selection and canonical ordering.
//!
//! The column set is a pure function of the user's selection:
//!
//! 1. tariff flags, sorted by identifier
//! 2. variable-group columns (Inflation/FFR, Sentiment/VIX, M1 supply)
//! 3. `{tariff}_lag_effect` for every selected tariff
//! 4. `{tariff}_future_effect` for every selected tariff
//!
//! `select_columns` rebuilds the table to exactly that order and reports the
//! delta it applied.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{VariableGroup, catalog};
use crate::error::AppError;
use crate::table::{Column, FeatureTable};

/// Variable groups and tariff identifiers chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub groups: BTreeSet<VariableGroup>,
    #[serde(default)]
    pub tariffs: BTreeSet<String>,
}

impl Selection {
    pub fn new(
        groups: impl IntoIterator<Item = VariableGroup>,
        tariffs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            groups: groups.into_iter().collect(),
            tariffs: tariffs.into_iter().map(Into::into).collect(),
        }
    }

    /// Every group and every catalog tariff.
    pub fn everything() -> Self {
        Self::new(VariableGroup::ALL, catalog::CATALOG.iter().map(|c| c.id))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for id in &self.tariffs {
            catalog::require(id)?;
        }
        Ok(())
    }
}

/// Columns added and removed by one selection step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ColumnDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Canonical non-date column order for a selection.
pub fn ordered_columns(selection: &Selection) -> Vec<String> {
    let mut out: Vec<String> = selection.tariffs.iter().cloned().collect();
    for g in VariableGroup::ALL {
        if selection.groups.contains(&g) {
            out.extend(g.columns().into_iter().map(str::to_string));
        }
    }
    out.extend(selection.tariffs.iter().map(|t| catalog::lag_column(t)));
    out.extend(selection.tariffs.iter().map(|t| catalog::future_column(t)));
    out
}

/// Rebuild `table` so its columns are exactly `ordered_columns(selection)`.
///
/// Populated cells of surviving columns are kept (missing cells become 0),
/// new columns are zero-initialised and everything else is dropped.
pub fn select_columns(
    mut table: FeatureTable,
    selection: &Selection,
) -> Result<(FeatureTable, ColumnDelta), AppError> {
    if table.is_empty() {
        return Err(AppError::precondition(
            "No business-day data available. Run calendar initialization first.",
        ));
    }
    selection.validate()?;

    let order = ordered_columns(selection);
    let n = table.len();
    let mut existing = table.columns().to_vec();

    let mut delta = ColumnDelta::default();
    let mut columns = Vec::with_capacity(order.len());
    for name in &order {
        match existing.iter().position(|c| &c.name == name) {
            Some(i) => {
                let mut col = existing.swap_remove(i);
                col.values = col.values.into_iter().map(|v| Some(v.unwrap_or(0.0))).collect();
                columns.push(col);
            }
            None => {
                delta.added.push(name.clone());
                columns.push(Column::zeros(name.clone(), n));
            }
        }
    }
    delta.removed = existing.into_iter().map(|c| c.name).collect();
    delta.removed.sort();

    table.replace_columns(columns);
    info!(
        columns = order.len(),
        added = delta.added.len(),
        removed = delta.removed.len(),
        schema_version = table.schema_version(),
        "columns selected"
    );
    Ok((table, delta))
}

/// Groups whose columns are all present in `names`, and groups only partially present.
pub fn groups_present(names: &[&str]) -> (Vec<VariableGroup>, Vec<VariableGroup>) {
    let mut full = Vec::new();
    let mut partial = Vec::new();
    for g in VariableGroup::ALL {
        let cols = g.columns();
        let hits = cols.iter().filter(|c| names.contains(c)).count();
        if hits == cols.len() {
            full.push(g);
        } else if hits > 0 {
            partial.push(g);
        }
    }
    (full, partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(n: usize) -> FeatureTable {
        let start = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
        FeatureTable::from_dates((0..n as u64).map(|i| start + chrono::Days::new(i)).collect()).unwrap()
    }

    #[test]
    fn canonical_order_follows_priority() {
        let sel = Selection::new(
            [VariableGroup::M1Supply, VariableGroup::InflationFfr],
            ["start_tariff_85", "start_tariff_39"],
        );
        assert_eq!(
            ordered_columns(&sel),
            vec![
                "start_tariff_39",
                "start_tariff_85",
                "diff_FFR",
                "diff_CPI",
                "diff_M1_supply",
                "start_tariff_39_lag_effect",
                "start_tariff_85_lag_effect",
                "start_tariff_39_future_effect",
                "start_tariff_85_future_effect",
            ]
        );
    }

    #[test]
    fn select_preserves_values_and_reports_delta() {
        let sel = Selection::new([VariableGroup::SentimentVix], Vec::<String>::new());
        let (mut t, delta) = select_columns(table(3), &sel).unwrap();
        assert_eq!(delta.added, vec!["VIX_close", "diff_CSD"]);
        t.set_dense("VIX_close", &[20.0, 21.0, 22.0]).unwrap();

        let sel2 = Selection::new(
            [VariableGroup::SentimentVix, VariableGroup::InflationFfr],
            ["start_tariff_72"],
        );
        let (t2, delta2) = select_columns(t, &sel2).unwrap();
        assert!(delta2.removed.is_empty());
        assert_eq!(t2.column_names()[0], "start_tariff_72");
        assert_eq!(
            t2.column("VIX_close").unwrap().values,
            vec![Some(20.0), Some(21.0), Some(22.0)]
        );
        assert_eq!(t2.column("diff_FFR").unwrap().values, vec![Some(0.0); 3]);

        let (t3, delta3) = select_columns(t2, &Selection::default()).unwrap();
        assert!(t3.column_names().is_empty());
        assert_eq!(delta3.removed.len(), 7);
    }

    #[test]
    fn schema_version_moves_only_on_column_changes() {
        let sel = Selection::new([VariableGroup::M1Supply], ["start_tariff_72"]);
        let (t, _) = select_columns(table(2), &sel).unwrap();
        let v = t.schema_version();
        let (t, delta) = select_columns(t, &sel).unwrap();
        assert!(delta.is_empty());
        assert_eq!(t.schema_version(), v);
        let (t, _) = select_columns(t, &Selection::default()).unwrap();
        assert_eq!(t.schema_version(), v + 1);
    }

    #[test]
    fn unknown_tariff_is_rejected() {
        let sel = Selection::new(Vec::new(), ["start_tariff_01"]);
        assert!(select_columns(table(2), &sel).is_err());
    }

    #[test]
    fn partial_groups_are_detected() {
        let (full, partial) = groups_present(&["diff_FFR", "VIX_close", "diff_CSD"]);
        assert_eq!(full, vec![VariableGroup::SentimentVix]);
        assert_eq!(partial, vec![VariableGroup::InflationFfr]);
    }
}
