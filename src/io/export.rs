//! CSV exports: forecast paths and the feature table.
//!
//! Both are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::DATE_COLUMN;
use crate::error::AppError;
use crate::models::ForecastSeries;
use crate::table::FeatureTable;

/// Write forecasts in long format: one row per (date, maturity).
pub fn write_forecast_csv(path: &Path, series: &[ForecastSeries]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create forecast CSV '{}': {e}", path.display())))?;
    write_forecasts(BufWriter::new(file), series)
}

pub fn write_forecasts<W: Write>(mut out: W, series: &[ForecastSeries]) -> Result<(), AppError> {
    let io_err = |e: std::io::Error| AppError::input(format!("Failed to write forecast CSV: {e}"));

    writeln!(out, "date,maturity_years,model_type,artifact,mean,lower,upper").map_err(io_err)?;
    for s in series {
        for (i, date) in s.dates.iter().enumerate() {
            writeln!(
                out,
                "{},{},{},{},{:.6},{:.6},{:.6}",
                date,
                s.maturity.years(),
                s.model_type.label(),
                s.artifact,
                s.path.mean[i],
                s.path.lower[i],
                s.path.upper[i],
            )
            .map_err(io_err)?;
        }
    }
    out.flush().map_err(io_err)
}

/// Write the feature table with its date column first; missing cells are empty.
pub fn write_table_csv(path: &Path, table: &FeatureTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create table CSV '{}': {e}", path.display())))?;
    write_table(BufWriter::new(file), table)
}

pub fn write_table<W: Write>(mut out: W, table: &FeatureTable) -> Result<(), AppError> {
    let io_err = |e: std::io::Error| AppError::input(format!("Failed to write table CSV: {e}"));

    let mut header = vec![DATE_COLUMN];
    header.extend(table.column_names());
    writeln!(out, "{}", header.join(",")).map_err(io_err)?;

    for (i, date) in table.dates().iter().enumerate() {
        let mut row = date.to_string();
        for c in table.columns() {
            row.push(',');
            if let Some(v) = c.values[i] {
                row.push_str(&v.to_string());
            }
        }
        writeln!(out, "{row}").map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}
