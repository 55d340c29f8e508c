//! Historical CSV ingest.
//!
//! The file carries a date column (`date` or `Business Day`) plus any number of
//! numeric columns that are merged onto the business-day range as-is.
//!
//! Leniency rules:
//! - an unnamed index column (`Unnamed: 0` or an empty header) is dropped
//! - unparsable numbers become missing cells
//! - rows with an unparsable or duplicate date are skipped and reported

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::AppError;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Parsed history: value columns in file order and rows keyed by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalData {
    pub columns: Vec<String>,
    pub rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl HistoricalData {
    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

pub fn load_history(path: &Path) -> Result<HistoricalData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open history CSV '{}': {e}", path.display())))?;
    read_history(file)
}

pub fn read_history<R: Read>(source: R) -> Result<HistoricalData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let date_idx = headers
        .iter()
        .position(|h| matches!(normalize_header_name(h).as_str(), "date" | "business day"))
        .ok_or_else(|| AppError::input("Missing required column: `date` (or `Business Day`)"))?;

    let value_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != date_idx && !is_index_column(h))
        .map(|(i, h)| (i, h.trim().trim_start_matches('\u{feff}').to_string()))
        .collect();

    let mut out = HistoricalData {
        columns: value_cols.iter().map(|(_, name)| name.clone()).collect(),
        ..HistoricalData::default()
    };

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        out.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let date = match record.get(date_idx).map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => match parse_date(s) {
                Ok(d) => d,
                Err(message) => {
                    out.row_errors.push(RowError { line, message });
                    continue;
                }
            },
            None => {
                out.row_errors.push(RowError {
                    line,
                    message: "Missing date value.".to_string(),
                });
                continue;
            }
        };

        if out.rows.contains_key(&date) {
            out.row_errors.push(RowError {
                line,
                message: format!("Duplicate date {date}; keeping the first row."),
            });
            continue;
        }
        out.rows.insert(date, parse_values(&record, &value_cols));
    }

    Ok(out)
}

fn parse_values(record: &StringRecord, value_cols: &[(usize, String)]) -> Vec<Option<f64>> {
    value_cols
        .iter()
        .map(|(i, _)| parse_opt_f64(record.get(*i)))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn is_index_column(name: &str) -> bool {
    let n = normalize_header_name(name);
    n.is_empty() || n.starts_with("unnamed:")
}

/// Parse a date in one of the accepted formats.
///
/// Timestamps such as `2025-03-21 00:00:00` are accepted by taking the date part.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    let head = s.split_whitespace().next().unwrap_or(s);
    let head = head.split('T').next().unwrap_or(head);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(head, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
