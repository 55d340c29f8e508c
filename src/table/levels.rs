//! Sparse level entry: checkpoints, interpolation and differencing.
//!
//! Users enter levels only on checkpoint dates chosen by a cadence. Every other
//! business day is reconstructed by time-weighted linear interpolation, then
//! converted to day-over-day changes (except VIX, which is kept as a level).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Cadence, MacroSeries, SeriesTransform, VariableGroup};
use crate::error::AppError;
use crate::table::FeatureTable;

/// One series' entries: the day-zero baseline plus values keyed by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesInput {
    /// Level on the business day before the first row being rewritten.
    pub baseline: f64,
    #[serde(default)]
    pub values: BTreeMap<NaiveDate, Option<f64>>,
}

/// A level-entry step for one variable group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInput {
    pub group: VariableGroup,
    pub cadence: Cadence,
    /// Only rows on or after this date are rewritten.
    #[serde(default)]
    pub window_start: Option<NaiveDate>,
    pub series: BTreeMap<MacroSeries, SeriesInput>,
}

/// Checkpoint dates for a cadence over ascending `dates`.
///
/// Walks from the first date by the cadence offset, taking the first date on or
/// after each step, and always ends with the last date.
pub fn checkpoints(dates: &[NaiveDate], cadence: Cadence) -> Vec<NaiveDate> {
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return Vec::new();
    };
    if cadence == Cadence::All {
        return dates.to_vec();
    }

    let mut out: Vec<NaiveDate> = Vec::new();
    let mut current = first;
    while current <= last {
        let i = dates.partition_point(|d| *d < current);
        if let Some(&d) = dates.get(i) {
            if out.last() != Some(&d) {
                out.push(d);
            }
        }
        match cadence.step(current) {
            Some(next) => current = next,
            None => break,
        }
    }
    if out.last() != Some(&last) {
        out.push(last);
    }
    out
}

/// Cadences whose number of steps over the range does not exceed the row count.
pub fn available_cadences(dates: &[NaiveDate]) -> Vec<Cadence> {
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return vec![Cadence::All];
    };
    Cadence::ALL
        .into_iter()
        .filter(|c| {
            let mut count = 0usize;
            let mut current = first;
            while current <= last {
                count += 1;
                match c.step(current) {
                    Some(next) => current = next,
                    None => return true,
                }
            }
            count <= dates.len()
        })
        .collect()
}

/// Fill the gaps of `sampled` (aligned with `dates`).
///
/// Interior gaps are interpolated linearly in calendar days, leading gaps take
/// `baseline` and trailing gaps carry the last known value forward.
pub fn interpolate_levels(dates: &[NaiveDate], sampled: &[Option<f64>], baseline: f64) -> Vec<f64> {
    let known: Vec<usize> = sampled
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();

    let mut out = Vec::with_capacity(sampled.len());
    let mut next = 0usize;
    for (i, v) in sampled.iter().enumerate() {
        if let Some(v) = v {
            out.push(*v);
            next += 1;
            continue;
        }
        let prev = next.checked_sub(1).map(|k| known[k]);
        let after = known.get(next).copied();
        let value = match (prev, after) {
            (None, _) => baseline,
            (Some(a), None) => out[a],
            (Some(a), Some(b)) => {
                let va = out[a];
                let vb = sampled[b].unwrap_or(va);
                let span = (dates[b] - dates[a]).num_days() as f64;
                let t = (dates[i] - dates[a]).num_days() as f64;
                if span > 0.0 { va + (vb - va) * t / span } else { va }
            }
        };
        out.push(value);
    }
    out
}

/// Day-over-day changes with the first change taken against `baseline`.
pub fn differences(levels: &[f64], baseline: f64) -> Vec<f64> {
    let mut prev = baseline;
    levels
        .iter()
        .map(|&v| {
            let d = v - prev;
            prev = v;
            d
        })
        .collect()
}

/// Rewrite the columns of `input.group` from sparse level entries.
///
/// With `zero_means_missing`, an entered 0.0 is treated as "not entered".
pub fn apply_levels(
    mut table: FeatureTable,
    input: &LevelInput,
    zero_means_missing: bool,
) -> Result<FeatureTable, AppError> {
    let group = input.group;
    for col in group.columns() {
        if !table.has_column(col) {
            return Err(AppError::precondition(format!(
                "{} is not selected (column `{col}` is missing); select it before entering levels.",
                group.display_name()
            )));
        }
    }
    for s in input.series.keys() {
        if s.group() != group {
            return Err(AppError::input(format!(
                "{} does not belong to {}.",
                s.display_name(),
                group.display_name()
            )));
        }
    }

    let start = input
        .window_start
        .map(|w| table.dates().partition_point(|d| *d < w))
        .unwrap_or(0);
    let window = table.dates()[start..].to_vec();
    if window.is_empty() {
        return Err(AppError::input(format!(
            "Level window starting {:?} contains no business days.",
            input.window_start
        )));
    }
    let points = checkpoints(&window, input.cadence);

    for &series in group.series() {
        let entry = input.series.get(&series).ok_or_else(|| {
            AppError::input(format!("Missing {} levels for {}.", series.display_name(), group.display_name()))
        })?;

        let mut sampled = vec![None; window.len()];
        let mut used = 0usize;
        for (date, value) in &entry.values {
            let value = value.filter(|v| v.is_finite() && !(zero_means_missing && *v == 0.0));
            match (points.binary_search(date), window.binary_search(date)) {
                (Ok(_), Ok(i)) => {
                    sampled[i] = value;
                    used += usize::from(value.is_some());
                }
                _ => debug!(series = series.display_name(), %date, "ignoring value off the checkpoint grid"),
            }
        }

        let levels = interpolate_levels(&window, &sampled, entry.baseline);
        let stored = match series.transform() {
            SeriesTransform::Delta => differences(&levels, entry.baseline),
            SeriesTransform::Level => levels,
        };

        let column = series.column();
        let mut values = table
            .column(column)
            .map(|c| c.values.clone())
            .unwrap_or_else(|| vec![None; table.len()]);
        for (slot, v) in values[start..].iter_mut().zip(stored) {
            *slot = Some(v);
        }
        table.set_values(column, values)?;
        debug!(column, sampled = used, checkpoints = points.len(), "levels interpolated");
    }

    info!(
        group = group.display_name(),
        cadence = input.cadence.display_name(),
        rows = window.len(),
        "levels applied"
    );
    Ok(table)
}
