//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the table/forecast/fit code stays clean and testable
//! - output changes are localized (the tests below pin the layouts)

use chrono::NaiveDate;

use crate::calendar::BusinessCalendar;
use crate::domain::catalog::CATALOG;
use crate::domain::{Frequency, ModelType};
use crate::error::AppError;
use crate::io::curve::{CurveFile, CurveSection};
use crate::models::ForecastSeries;
use crate::table::FeatureTable;
use crate::table::schema::ColumnDelta;

/// Header block of a `yw run`.
pub fn format_run_summary(
    table: &FeatureTable,
    model_type: ModelType,
    frequency: Frequency,
    history_loaded: bool,
) -> String {
    let mut out = String::new();

    out.push_str("=== yw - Yield Forecast Wizard ===\n");
    match (table.first_date(), table.last_date()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("Window: {first} .. {last} ({} rows)\n", table.len()))
        }
        _ => out.push_str("Window: (empty)\n"),
    }
    out.push_str(&format!(
        "Frequency: {}\n",
        match frequency {
            Frequency::Daily => "daily",
            Frequency::Monthly => "monthly",
        }
    ));
    out.push_str(&format!(
        "History: {}\n",
        if history_loaded { "merged" } else { "not loaded" }
    ));
    out.push_str(&format!("Model type: {}\n", model_type.label()));
    out.push_str(&format!("Columns: {}\n", table.columns().len()));
    out.push('\n');

    out
}

pub fn format_calendar(calendar: &BusinessCalendar, show_days: bool) -> String {
    let mut out = String::new();
    match (calendar.first(), calendar.last()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("Business days: {} ({first} .. {last})\n", calendar.len()));
        }
        _ => out.push_str("Business days: 0\n"),
    }
    if show_days {
        for d in calendar.days() {
            out.push_str(&format!("{d}\n"));
        }
    }
    out
}

/// Column list in table order, with markers for the last selection change.
pub fn format_columns(table: &FeatureTable, delta: Option<&ColumnDelta>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Columns ({}):\n", table.columns().len()));
    for (i, name) in table.column_names().into_iter().enumerate() {
        let added = delta.is_some_and(|d| d.added.iter().any(|a| a == name));
        let marker = if added { "+" } else { " " };
        out.push_str(&format!("{marker}{:>3}  {name}\n", i + 1));
    }
    if let Some(d) = delta {
        for name in &d.removed {
            out.push_str(&format!("-      {name}\n"));
        }
    }
    out
}

/// One row per maturity, read at `target` (or the last row when `None`).
pub fn format_forecasts(series: &[ForecastSeries], target: Option<NaiveDate>) -> Result<String, AppError> {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<9} {:<10} {:>9} {:>9} {:>9}  {}\n",
            "maturity", "date", "mean", "lower", "upper", "artifact"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<9} {:-<10} {:-<9} {:-<9} {:-<9}  {:-<8}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for s in series {
        let point = match target {
            Some(t) => s.at(t)?,
            None => s
                .last()
                .ok_or_else(|| AppError::numerical(format!("Empty forecast from '{}'.", s.artifact)))?,
        };
        out.push_str(&format!(
            "{:<9} {:<10} {:>9.4} {:>9.4} {:>9.4}  {}\n",
            format!("{}y", s.maturity.years()),
            point.date,
            point.mean,
            point.lower,
            point.upper,
            s.artifact,
        ));
    }
    Ok(out)
}

fn format_section(title: &str, section: &CurveSection) -> String {
    let p = &section.params;
    let mut out = String::new();
    out.push_str(&format!("{title}:\n"));
    out.push_str(&format!(
        "- level={:.4} slope={:.4} curvature={:.4} lambda={:.4}\n",
        p.level, p.slope, p.curvature, p.lambda
    ));
    out.push_str(&format!("- mse  : {:.3e}\n", section.mse));
    out.push_str(&format!("- tau  : {}\n", fmt_vec(&section.maturities, 0)));
    out.push_str(&format!("- y    : {}\n", fmt_vec(&section.yields, 4)));
    out.push_str(&format!("- fit  : {}\n", fmt_vec(&section.fitted_yields, 4)));
    out
}

/// Fitted curve parameters and the explanation lines.
pub fn format_curve(curve: &CurveFile) -> String {
    let mut out = String::new();
    if let Some(current) = &curve.current {
        out.push_str(&format_section("Current curve", current));
    }
    out.push_str(&format_section(&format!("Forecast curve ({})", curve.as_of), &curve.forecast));
    if !curve.explanations.is_empty() {
        out.push('\n');
        out.push_str(&format_explanations(&curve.explanations));
    }
    out
}

pub fn format_explanations(lines: &[String]) -> String {
    let mut out = String::from("Explanation:\n");
    for line in lines {
        out.push_str(&format!("* {line}\n"));
    }
    out
}

pub fn format_tariff_catalog() -> String {
    let mut out = String::new();
    for c in &CATALOG {
        out.push_str(&format!("{:<16} {}\n", c.id, c.label));
    }
    out
}

fn fmt_vec(v: &[f64], decimals: usize) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.decimals$}")).collect();
    format!("[{}]", parts.join(", "))
}
