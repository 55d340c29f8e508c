//! Monthly aggregation of the daily feature table.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::domain::catalog;
use crate::error::AppError;
use crate::table::events::refresh_effects;
use crate::table::{Column, FeatureTable};

/// Collapse to one row per calendar month, labelled by the month's last business day.
///
/// Columns are averaged over their present cells; tariff flags become 1 when any
/// day in the month is flagged and their lag/future columns are recomputed.
pub fn to_monthly(table: &FeatureTable) -> Result<FeatureTable, AppError> {
    let mut buckets: Vec<(NaiveDate, Vec<usize>)> = Vec::new();
    for (i, d) in table.dates().iter().enumerate() {
        match buckets.last_mut() {
            Some((label, rows)) if (label.year(), label.month()) == (d.year(), d.month()) => {
                *label = *d;
                rows.push(i);
            }
            _ => buckets.push((*d, vec![i])),
        }
    }

    let columns = table
        .columns()
        .iter()
        .map(|c| {
            let flag = catalog::is_tariff_column(&c.name);
            let values = buckets
                .iter()
                .map(|(_, rows)| {
                    let present: Vec<f64> = rows.iter().filter_map(|&i| c.values[i]).collect();
                    if present.is_empty() {
                        None
                    } else if flag {
                        Some(if present.iter().any(|v| *v > 0.0) { 1.0 } else { 0.0 })
                    } else {
                        Some(present.iter().sum::<f64>() / present.len() as f64)
                    }
                })
                .collect();
            Column {
                name: c.name.clone(),
                values,
            }
        })
        .collect();

    let dates = buckets.iter().map(|(d, _)| *d).collect();
    let mut monthly = FeatureTable::with_columns(dates, columns, table.schema_version());
    refresh_effects(&mut monthly)?;
    debug!(daily = table.len(), monthly = monthly.len(), "resampled to monthly");
    Ok(monthly)
}

/// Monthly row that holds `target`: the label in the same calendar month that
/// falls on or after it.
pub fn month_row(dates: &[NaiveDate], target: NaiveDate) -> Option<NaiveDate> {
    dates
        .iter()
        .copied()
        .find(|d| *d >= target && (d.year(), d.month()) == (target.year(), target.month()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{BusinessCalendar, UsFederalCalendar};
    use crate::table::events::{EventSet, apply_events};
    use crate::table::schema::{Selection, select_columns};
    use crate::domain::VariableGroup;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_rows_use_last_business_day_and_any_flag() {
        let cal = BusinessCalendar::build(ymd(2025, 3, 21), ymd(2025, 5, 15), &UsFederalCalendar).unwrap();
        let table = FeatureTable::from_calendar(&cal).unwrap();
        let sel = Selection::new([VariableGroup::SentimentVix], ["start_tariff_72"]);
        let (mut table, _) = select_columns(table, &sel).unwrap();
        let vix: Vec<f64> = (0..table.len()).map(|i| i as f64).collect();
        table.set_dense("VIX_close", &vix).unwrap();

        let mut set = EventSet::new();
        set.record("start_tariff_72", ymd(2025, 4, 10), &cal).unwrap();
        let table = apply_events(table, &set).unwrap();

        let monthly = to_monthly(&table).unwrap();
        assert_eq!(monthly.dates(), &[ymd(2025, 3, 31), ymd(2025, 4, 30), ymd(2025, 5, 15)]);
        assert_eq!(monthly.column("start_tariff_72").unwrap().filled(0.0), vec![0.0, 1.0, 0.0]);
        assert_eq!(
            monthly.column("start_tariff_72_lag_effect").unwrap().filled(0.0),
            vec![0.0, 0.0, 1.0]
        );
        assert_eq!(
            monthly.column("start_tariff_72_future_effect").unwrap().filled(0.0),
            vec![1.0, 0.0, 0.0]
        );
        // March has 7 business days from the 21st: indices 0..=6.
        let march_mean = monthly.column("VIX_close").unwrap().values[0].unwrap();
        assert!((march_mean - 3.0).abs() < 1e-12);
        assert_eq!(monthly.column_names(), table.column_names());
    }

    #[test]
    fn targets_map_to_their_own_month() {
        let labels = [ymd(2025, 3, 31), ymd(2025, 4, 30), ymd(2025, 5, 15)];
        assert_eq!(month_row(&labels, ymd(2025, 3, 25)), Some(ymd(2025, 3, 31)));
        assert_eq!(month_row(&labels, ymd(2025, 4, 1)), Some(ymd(2025, 4, 30)));
        assert_eq!(month_row(&labels, ymd(2025, 4, 30)), Some(ymd(2025, 4, 30)));
        assert_eq!(month_row(&labels, ymd(2025, 5, 16)), None);
        assert_eq!(month_row(&labels, ymd(2025, 6, 2)), None);
    }
}
