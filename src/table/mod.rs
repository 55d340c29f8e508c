//! The feature table: one row per business day, columns accumulated step by step.
//!
//! Each wizard step takes a `FeatureTable` by value and returns the updated one,
//! so steps stay independently testable and there is no shared mutable state.
//!
//! Invariants:
//! - dates are strictly ascending and unique
//! - every column has exactly one cell per date
//! - `schema_version` increases whenever the column set changes

pub mod events;
pub mod levels;
pub mod resample;
pub mod schema;

use chrono::NaiveDate;
use nalgebra::DMatrix;

use crate::calendar::BusinessCalendar;
use crate::domain::DATE_COLUMN;
use crate::error::AppError;
use crate::io::history::HistoricalData;

/// A named column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn zeros(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            values: vec![Some(0.0); len],
        }
    }

    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Self {
        Self {
            name: name.into(),
            values: values.iter().copied().map(Some).collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|v| v.is_some_and(f64::is_finite))
    }

    /// Values with missing cells replaced by `fill`.
    pub fn filled(&self, fill: f64) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(fill)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
    schema_version: u32,
}

impl FeatureTable {
    /// Create a table with only the date column.
    pub fn from_dates(dates: Vec<NaiveDate>) -> Result<Self, AppError> {
        if dates.is_empty() {
            return Err(AppError::precondition(
                "No business days in range. Run calendar initialization first.",
            ));
        }
        if !dates.windows(2).all(|w| w[0] < w[1]) {
            return Err(AppError::input(format!(
                "`{DATE_COLUMN}` must be strictly increasing with no duplicates."
            )));
        }
        Ok(Self {
            dates,
            columns: Vec::new(),
            schema_version: 0,
        })
    }

    pub fn from_calendar(calendar: &BusinessCalendar) -> Result<Self, AppError> {
        Self::from_dates(calendar.days().to_vec())
    }

    /// Left-join historical columns onto the business-day range.
    ///
    /// Dates absent from the history get missing cells; history rows outside the
    /// range are ignored.
    pub fn merge_history(mut self, history: &HistoricalData) -> Self {
        for (j, name) in history.columns.iter().enumerate() {
            let values = self
                .dates
                .iter()
                .map(|d| history.rows.get(d).and_then(|row| row.get(j).copied().flatten()))
                .collect();
            self.upsert(Column {
                name: name.clone(),
                values,
            });
        }
        self
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Non-date column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn row_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Replace the values of an existing column.
    pub fn set_values(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<(), AppError> {
        if values.len() != self.dates.len() {
            return Err(AppError::input(format!(
                "Column `{name}` has {} values but the table has {} rows.",
                values.len(),
                self.dates.len()
            )));
        }
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| AppError::precondition(format!("Column `{name}` is not in the feature table.")))?;
        col.values = values;
        Ok(())
    }

    pub fn set_dense(&mut self, name: &str, values: &[f64]) -> Result<(), AppError> {
        self.set_values(name, values.iter().copied().map(Some).collect())
    }

    /// `true` when no non-date cell is missing.
    pub fn is_complete(&self) -> bool {
        self.columns.iter().all(Column::is_complete)
    }

    /// Exogenous matrix (rows = dates, columns = non-date columns in table order).
    pub fn exog_matrix(&self) -> Result<DMatrix<f64>, AppError> {
        let plan: Vec<Option<usize>> = (0..self.columns.len()).map(Some).collect();
        self.exog_matrix_for(&plan)
    }

    /// Exogenous matrix with one output column per `plan` entry: `Some(i)` copies
    /// table column `i`, `None` is a column of zeros.
    pub fn exog_matrix_for(&self, plan: &[Option<usize>]) -> Result<DMatrix<f64>, AppError> {
        for &i in plan.iter().flatten() {
            let c = self.columns.get(i).ok_or_else(|| {
                AppError::dispatch(format!("Column index {i} is outside the feature table."))
            })?;
            if let Some(r) = c.values.iter().position(|v| !v.is_some_and(f64::is_finite)) {
                return Err(AppError::precondition(format!(
                    "Column `{}` has no value on {}; apply its wizard step first.",
                    c.name, self.dates[r]
                )));
            }
        }
        let n = self.dates.len();
        Ok(DMatrix::from_fn(n, plan.len(), |r, j| {
            plan[j]
                .and_then(|i| self.columns[i].values[r])
                .unwrap_or(0.0)
        }))
    }

    /// Replace the whole column set (schema change).
    pub(crate) fn replace_columns(&mut self, columns: Vec<Column>) {
        let changed = columns.len() != self.columns.len()
            || columns.iter().zip(&self.columns).any(|(a, b)| a.name != b.name);
        self.columns = columns;
        if changed {
            self.schema_version += 1;
        }
    }

    fn upsert(&mut self, column: Column) {
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == column.name) {
            *existing = column;
        } else {
            self.columns.push(column);
            self.schema_version += 1;
        }
    }

    /// Build a table with explicit columns (used by aggregation).
    pub(crate) fn with_columns(dates: Vec<NaiveDate>, columns: Vec<Column>, schema_version: u32) -> Self {
        Self {
            dates,
            columns,
            schema_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_dates_enforces_key_invariant() {
        assert!(FeatureTable::from_dates(vec![]).is_err());
        assert!(FeatureTable::from_dates(vec![ymd(2025, 3, 24), ymd(2025, 3, 24)]).is_err());
        assert!(FeatureTable::from_dates(vec![ymd(2025, 3, 25), ymd(2025, 3, 24)]).is_err());
        let t = FeatureTable::from_dates(vec![ymd(2025, 3, 24), ymd(2025, 3, 25)]).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.column_names().is_empty());
    }

    #[test]
    fn merge_history_is_a_left_join() {
        let mut rows = BTreeMap::new();
        rows.insert(ymd(2025, 3, 24), vec![Some(1.5), None]);
        rows.insert(ymd(2024, 1, 2), vec![Some(9.0), Some(9.0)]);
        let history = HistoricalData {
            columns: vec!["diff_FFR".to_string(), "other".to_string()],
            rows,
            row_errors: Vec::new(),
            rows_read: 2,
        };
        let t = FeatureTable::from_dates(vec![ymd(2025, 3, 24), ymd(2025, 3, 25)])
            .unwrap()
            .merge_history(&history);
        assert_eq!(t.column_names(), vec!["diff_FFR", "other"]);
        assert_eq!(t.column("diff_FFR").unwrap().values, vec![Some(1.5), None]);
        assert_eq!(t.column("other").unwrap().values, vec![None, None]);
        assert!(!t.is_complete());
        assert!(t.exog_matrix().is_err());
    }

    #[test]
    fn exog_matrix_preserves_column_order() {
        let mut t = FeatureTable::from_dates(vec![ymd(2025, 3, 24), ymd(2025, 3, 25)]).unwrap();
        t.replace_columns(vec![
            Column::from_values("b", &[1.0, 2.0]),
            Column::from_values("a", &[3.0, 4.0]),
        ]);
        let x = t.exog_matrix().unwrap();
        assert_eq!(x.shape(), (2, 2));
        assert_eq!(x[(1, 0)], 2.0);
        assert_eq!(x[(0, 1)], 3.0);
        assert_eq!(t.schema_version(), 1);
    }

    #[test]
    fn planned_matrix_reorders_and_zero_fills() {
        let mut t = FeatureTable::from_dates(vec![ymd(2025, 3, 24), ymd(2025, 3, 25)]).unwrap();
        t.replace_columns(vec![
            Column::from_values("b", &[1.0, 2.0]),
            Column::from_values("a", &[3.0, 4.0]),
        ]);
        let x = t.exog_matrix_for(&[Some(1), None, Some(0)]).unwrap();
        assert_eq!(x.shape(), (2, 3));
        assert_eq!(x[(0, 0)], 3.0);
        assert_eq!(x[(1, 1)], 0.0);
        assert_eq!(x[(1, 2)], 2.0);
        assert!(t.exog_matrix_for(&[Some(2)]).is_err());
    }
}
