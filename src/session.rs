//! Wizard session state.
//!
//! A session owns the business-day calendar and the feature table once they
//! exist, and threads the table through each step function by value. Steps that
//! need upstream state fail with a precondition error when it is absent; a
//! failed step leaves the previous table untouched.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::calendar::{BusinessCalendar, HolidayCalendar};
use crate::domain::ModelType;
use crate::error::AppError;
use crate::io::history::{HistoricalData, load_history};
use crate::models::model_type_for;
use crate::table::FeatureTable;
use crate::table::events::{EventSet, TariffEvent, apply_events};
use crate::table::levels::{LevelInput, apply_levels};
use crate::table::schema::{ColumnDelta, Selection, select_columns};

#[derive(Debug, Clone, Default)]
pub struct WizardSession {
    calendar: Option<BusinessCalendar>,
    table: Option<FeatureTable>,
    selection: Selection,
    events: EventSet,
    zero_means_missing: bool,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat entered 0.0 levels as "not entered".
    pub fn with_zero_means_missing(mut self, on: bool) -> Self {
        self.zero_means_missing = on;
        self
    }

    /// Build the calendar for `[start, end]` and a fresh date-only table.
    ///
    /// Re-initializing discards the previous table, selection and events.
    pub fn initialize(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        holidays: &impl HolidayCalendar,
    ) -> Result<&FeatureTable, AppError> {
        let calendar = BusinessCalendar::build(start, end, holidays)?;
        let table = FeatureTable::from_calendar(&calendar)?;
        info!(%start, %end, business_days = calendar.len(), "calendar initialized");
        self.calendar = Some(calendar);
        self.selection = Selection::default();
        self.events = EventSet::new();
        Ok(self.table.insert(table))
    }

    pub fn calendar(&self) -> Result<&BusinessCalendar, AppError> {
        self.calendar
            .as_ref()
            .ok_or_else(|| AppError::precondition("No business-day calendar. Run calendar initialization first."))
    }

    pub fn table(&self) -> Result<&FeatureTable, AppError> {
        self.table
            .as_ref()
            .ok_or_else(|| AppError::precondition("No feature table. Run calendar initialization first."))
    }

    pub fn into_table(self) -> Result<FeatureTable, AppError> {
        self.table
            .ok_or_else(|| AppError::precondition("No feature table. Run calendar initialization first."))
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn events(&self) -> &EventSet {
        &self.events
    }

    /// Left-join historical columns onto the table.
    pub fn merge_history(&mut self, history: &HistoricalData) -> Result<(), AppError> {
        let table = self.table()?.clone().merge_history(history);
        info!(
            columns = history.columns.len(),
            rows = history.rows_used(),
            row_errors = history.row_errors.len(),
            "history merged"
        );
        self.table = Some(table);
        Ok(())
    }

    /// Load and merge a history CSV; an unreadable file only logs a warning.
    pub fn load_history_lenient(&mut self, path: &Path) -> Result<bool, AppError> {
        self.table()?;
        match load_history(path) {
            Ok(history) => {
                for e in &history.row_errors {
                    warn!(line = e.line, "{}", e.message);
                }
                self.merge_history(&history)?;
                Ok(true)
            }
            Err(err) => {
                warn!(path = %path.display(), "history not loaded: {err}");
                Ok(false)
            }
        }
    }

    /// Rebuild the column set for `selection`, then re-apply recorded events.
    pub fn select(&mut self, selection: Selection) -> Result<ColumnDelta, AppError> {
        let (mut table, delta) = select_columns(self.table()?.clone(), &selection)?;
        if !self.events.is_empty() {
            table = apply_events(table, &self.events)?;
        }
        self.table = Some(table);
        self.selection = selection;
        Ok(delta)
    }

    pub fn apply_levels(&mut self, input: &LevelInput) -> Result<(), AppError> {
        let table = apply_levels(self.table()?.clone(), input, self.zero_means_missing)?;
        self.table = Some(table);
        Ok(())
    }

    /// Record one event; dates outside the calendar are ignored (`Ok(false)`).
    pub fn record_event(&mut self, category: &str, date: NaiveDate) -> Result<bool, AppError> {
        let calendar = self
            .calendar
            .as_ref()
            .ok_or_else(|| AppError::precondition("No business-day calendar. Run calendar initialization first."))?;
        self.events.record(category, date, calendar)
    }

    pub fn record_events<'a>(&mut self, events: impl IntoIterator<Item = &'a TariffEvent>) -> Result<usize, AppError> {
        let calendar = self
            .calendar
            .as_ref()
            .ok_or_else(|| AppError::precondition("No business-day calendar. Run calendar initialization first."))?;
        self.events.record_all(events, calendar)
    }

    /// Write flag and effect columns for the recorded events.
    pub fn apply_events(&mut self) -> Result<(), AppError> {
        self.calendar()?;
        let table = apply_events(self.table()?.clone(), &self.events)?;
        self.table = Some(table);
        Ok(())
    }

    pub fn model_type(&self) -> Result<ModelType, AppError> {
        model_type_for(self.table()?)
    }
}
