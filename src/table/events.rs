//! Tariff event flags and their lag/future effect columns.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::BusinessCalendar;
use crate::domain::catalog;
use crate::error::AppError;
use crate::table::FeatureTable;

/// A single (category, date) implementation event as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffEvent {
    pub category: String,
    pub date: NaiveDate,
}

/// Recorded implementation dates per tariff category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSet {
    events: BTreeMap<String, BTreeSet<NaiveDate>>,
}

impl EventSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event. Dates outside the calendar are ignored (`Ok(false)`).
    pub fn record(
        &mut self,
        category: &str,
        date: NaiveDate,
        calendar: &BusinessCalendar,
    ) -> Result<bool, AppError> {
        let category = catalog::require(category)?;
        if !calendar.contains(date) {
            debug!(category = category.id, %date, "ignoring event outside the business-day calendar");
            return Ok(false);
        }
        Ok(self
            .events
            .entry(category.id.to_string())
            .or_default()
            .insert(date))
    }

    /// Record a batch, returning how many events were stored.
    pub fn record_all<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a TariffEvent>,
        calendar: &BusinessCalendar,
    ) -> Result<usize, AppError> {
        let mut stored = 0;
        for e in events {
            if self.record(&e.category, e.date, calendar)? {
                stored += 1;
            }
        }
        Ok(stored)
    }

    pub fn dates(&self, category: &str) -> Option<&BTreeSet<NaiveDate>> {
        self.events.get(category)
    }

    pub fn len(&self) -> usize {
        self.events.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }
}

/// Flags shifted one row later; the first row is 0.
pub fn lag_effect(flags: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; flags.len()];
    if flags.len() > 1 {
        out[1..].copy_from_slice(&flags[..flags.len() - 1]);
    }
    out
}

/// Flags shifted one row earlier; the last row is 0.
pub fn future_effect(flags: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; flags.len()];
    if flags.len() > 1 {
        let n = flags.len();
        out[..n - 1].copy_from_slice(&flags[1..]);
    }
    out
}

/// Recompute lag and future columns from the flag column of every selected tariff.
pub fn refresh_effects(table: &mut FeatureTable) -> Result<(), AppError> {
    let selected: Vec<&'static str> = catalog::CATALOG
        .iter()
        .map(|c| c.id)
        .filter(|id| table.has_column(id))
        .collect();
    for id in selected {
        let flags = table.column(id).map(|c| c.filled(0.0)).unwrap_or_default();
        let lag = catalog::lag_column(id);
        if table.has_column(&lag) {
            table.set_dense(&lag, &lag_effect(&flags))?;
        }
        let future = catalog::future_column(id);
        if table.has_column(&future) {
            table.set_dense(&future, &future_effect(&flags))?;
        }
    }
    Ok(())
}

/// Set flag, lag and future columns for every selected tariff from `events`.
///
/// Categories with events but no column in the table are skipped. Applying the
/// same event set twice yields the same table.
pub fn apply_events(mut table: FeatureTable, events: &EventSet) -> Result<FeatureTable, AppError> {
    if table.is_empty() {
        return Err(AppError::precondition(
            "No feature table. Run calendar initialization first.",
        ));
    }
    let mut flagged = 0usize;
    for c in &catalog::CATALOG {
        if !table.has_column(c.id) {
            if events.dates(c.id).is_some_and(|d| !d.is_empty()) {
                debug!(category = c.id, "events recorded for an unselected tariff");
            }
            continue;
        }
        let flags: Vec<f64> = match events.dates(c.id) {
            Some(dates) => table
                .dates()
                .iter()
                .map(|d| if dates.contains(d) { 1.0 } else { 0.0 })
                .collect(),
            None => vec![0.0; table.len()],
        };
        flagged += flags.iter().filter(|f| **f > 0.0).count();
        table.set_dense(c.id, &flags)?;
    }
    refresh_effects(&mut table)?;
    info!(events = events.len(), flagged_rows = flagged, "tariff events applied");
    Ok(table)
}
