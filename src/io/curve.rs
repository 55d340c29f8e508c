//! Read/write curve JSON files.
//!
//! Curve JSON is the portable result of a run's curve stage:
//! - the forecast curve (and the current curve when one was observed)
//! - AFNS parameters, observations and fitted values per curve
//! - a precomputed fitted grid for quick plotting
//! - the explanation lines comparing the two curves

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AfnsParams, ModelType};
use crate::error::AppError;
use crate::fit::AfnsFit;
use crate::math::afns_yield;

/// Points in the fitted grid written to curve files.
pub const GRID_POINTS: usize = 101;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub maturity_years: Vec<f64>,
    pub y: Vec<f64>,
}

/// One fitted curve with its observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSection {
    pub params: AfnsParams,
    pub maturities: Vec<f64>,
    pub yields: Vec<f64>,
    pub fitted_yields: Vec<f64>,
    pub mse: f64,
    pub grid: CurveGrid,
}

impl CurveSection {
    pub fn from_fit(maturities: &[f64], yields: &[f64], fit: &AfnsFit) -> Self {
        let t0 = maturities.iter().copied().fold(f64::INFINITY, f64::min);
        let t1 = maturities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            params: fit.params,
            maturities: maturities.to_vec(),
            yields: yields.to_vec(),
            fitted_yields: fit.fitted_yields.clone(),
            mse: fit.mse,
            grid: build_grid(&fit.params, t0, t1, GRID_POINTS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub as_of: NaiveDate,
    pub model_type: ModelType,
    pub forecast: CurveSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<CurveSection>,
    #[serde(default)]
    pub explanations: Vec<String>,
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::input(format!("Failed to write curve JSON: {e}")))?;
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}

/// Evenly spaced fitted values over `[t0, t1]`.
pub fn build_grid(params: &AfnsParams, t0: f64, t1: f64, n: usize) -> CurveGrid {
    let n = n.max(2);
    let (mut t0, mut t1) = (t0, t1);
    if !(t0.is_finite() && t1.is_finite()) || t1 < t0 {
        t0 = 0.25;
        t1 = 30.0;
    }
    if (t1 - t0).abs() < 1e-9 {
        t0 = (t0 - 0.5).max(0.01);
        t1 += 0.5;
    }

    let maturity_years: Vec<f64> = (0..n)
        .map(|i| t0 + (t1 - t0) * i as f64 / (n as f64 - 1.0))
        .collect();
    let y = maturity_years.iter().map(|&t| afns_yield(params, t)).collect();
    CurveGrid { maturity_years, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AfnsParams {
        AfnsParams {
            level: 4.0,
            slope: -0.5,
            curvature: 0.3,
            lambda: 0.6,
        }
    }

    #[test]
    fn grid_spans_requested_range() {
        let g = build_grid(&params(), 2.0, 20.0, GRID_POINTS);
        assert_eq!(g.maturity_years.len(), GRID_POINTS);
        assert_eq!(g.maturity_years[0], 2.0);
        assert!((g.maturity_years[100] - 20.0).abs() < 1e-12);
        assert!(g.y.iter().all(|v| v.is_finite()));

        let degenerate = build_grid(&params(), 5.0, 5.0, 3);
        assert!(degenerate.maturity_years[0] < 5.0 && degenerate.maturity_years[2] > 5.0);
    }

    #[test]
    fn curve_json_round_trip() {
        let fit = AfnsFit {
            params: params(),
            fitted_yields: vec![3.6, 3.7, 3.8, 3.9],
            mse: 1e-4,
            iterations: 7,
        };
        let section = CurveSection::from_fit(&[2.0, 5.0, 10.0, 20.0], &[3.6, 3.7, 3.8, 3.9], &fit);
        let curve = CurveFile {
            tool: "yw".to_string(),
            as_of: NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            model_type: ModelType::VixCs,
            forecast: section.clone(),
            current: Some(section),
            explanations: vec!["x".to_string()],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        write_curve_json(&path, &curve).unwrap();
        let back = read_curve_json(&path).unwrap();
        assert_eq!(back.as_of, curve.as_of);
        assert_eq!(back.model_type, ModelType::VixCs);
        assert_eq!(back.explanations, curve.explanations);
        assert_eq!(back.forecast.grid.y.len(), GRID_POINTS);
        assert!((back.forecast.params.lambda - 0.6).abs() < 1e-12);
        assert!(back.current.is_some());
    }
}
