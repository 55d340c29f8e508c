//! ARIMAX(p, d, 0) forecaster decoded from a JSON artifact.
//!
//! With `w` the working series (`y` itself for `d = 0`, `Δy` for `d = 1`):
//!
//! ```text
//! w_t = c + Σ φ_i w_{t-i} + β · x_t + ε_t,   ε_t ~ N(0, σ²)
//! ```
//!
//! Mean forecasts are produced by recursion from the stored history. Interval
//! half-widths are `z_{1-α/2} · σ · sqrt(Σ ψ_j²)`, where `ψ` are the impulse-response
//! weights of the AR polynomial (cumulated when `d = 1`).

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::AppError;
use crate::models::forecast::{ForecastPath, Forecaster};

fn default_alpha() -> f64 {
    0.2
}

/// Serialized ARIMAX description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaxArtifact {
    pub intercept: f64,
    #[serde(default)]
    pub ar: Vec<f64>,
    /// Integration order, 0 or 1.
    #[serde(default)]
    pub d: u8,
    pub exog_columns: Vec<String>,
    pub exog_coefs: Vec<f64>,
    pub sigma: f64,
    /// Most recent observed levels, oldest first.
    #[serde(default)]
    pub history: Vec<f64>,
    /// Interval significance; 0.2 gives 80% bands.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl ArimaxArtifact {
    /// Check internal consistency; `name` is used in error messages.
    pub fn validate(&self, name: &str) -> Result<(), AppError> {
        let bad = |what: String| AppError::dispatch(format!("Artifact `{name}` is incompatible: {what}."));
        if self.d > 1 {
            return Err(bad(format!("integration order {} is not supported", self.d)));
        }
        if self.exog_columns.len() != self.exog_coefs.len() {
            return Err(bad(format!(
                "{} exogenous columns but {} coefficients",
                self.exog_columns.len(),
                self.exog_coefs.len()
            )));
        }
        if !(self.sigma.is_finite() && self.sigma >= 0.0) {
            return Err(bad(format!("sigma {} must be finite and >= 0", self.sigma)));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(bad(format!("alpha {} must lie in (0, 1)", self.alpha)));
        }
        let needed = self.ar.len() + usize::from(self.d);
        if self.history.len() < needed {
            return Err(bad(format!(
                "history has {} values but AR order {} with d={} needs {needed}",
                self.history.len(),
                self.ar.len(),
                self.d
            )));
        }
        let finite = std::iter::once(self.intercept)
            .chain(self.ar.iter().copied())
            .chain(self.exog_coefs.iter().copied())
            .chain(self.history.iter().copied())
            .all(f64::is_finite);
        if !finite {
            return Err(bad("non-finite coefficients or history".to_string()));
        }
        Ok(())
    }

    /// Impulse-response weights ψ_0..ψ_{h-1}, cumulated when integrated.
    pub fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let mut psi: Vec<f64> = Vec::with_capacity(horizon);
        for j in 0..horizon {
            let v: f64 = if j == 0 {
                1.0
            } else {
                self.ar
                    .iter()
                    .enumerate()
                    .take(j)
                    .map(|(i, phi)| phi * psi[j - 1 - i])
                    .sum()
            };
            psi.push(v);
        }
        if self.d == 1 {
            let mut acc = 0.0;
            for v in psi.iter_mut() {
                acc += *v;
                *v = acc;
            }
        }
        psi
    }

    fn working_history(&self) -> Vec<f64> {
        if self.d == 1 {
            self.history.windows(2).map(|w| w[1] - w[0]).collect()
        } else {
            self.history.clone()
        }
    }
}

impl Forecaster for ArimaxArtifact {
    fn exog_columns(&self) -> &[String] {
        &self.exog_columns
    }

    fn forecast(&self, exog: &DMatrix<f64>, horizon: usize) -> Result<ForecastPath, AppError> {
        self.validate("in-memory")?;
        if exog.ncols() != self.exog_coefs.len() {
            return Err(AppError::dispatch(format!(
                "Exogenous matrix has {} columns but the model expects {}.",
                exog.ncols(),
                self.exog_coefs.len()
            )));
        }
        if exog.nrows() != horizon {
            return Err(AppError::input(format!(
                "Exogenous matrix has {} rows for a horizon of {horizon}.",
                exog.nrows()
            )));
        }

        let mut w = self.working_history();
        let base = w.len();
        for t in 0..horizon {
            let ar: f64 = self
                .ar
                .iter()
                .enumerate()
                .map(|(i, phi)| phi * w[base + t - 1 - i])
                .sum();
            let x: f64 = exog
                .row(t)
                .iter()
                .zip(&self.exog_coefs)
                .map(|(x, b)| x * b)
                .sum();
            w.push(self.intercept + ar + x);
        }

        let mut mean = Vec::with_capacity(horizon);
        let mut level = if self.d == 1 { self.history.last().copied().unwrap_or(0.0) } else { 0.0 };
        for &v in &w[base..] {
            if self.d == 1 {
                level += v;
                mean.push(level);
            } else {
                mean.push(v);
            }
        }
        if mean.iter().any(|m| !m.is_finite()) {
            return Err(AppError::numerical("ARIMAX recursion diverged."));
        }

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| AppError::numerical(format!("Interval distribution error: {e}")))?;
        let z = normal.inverse_cdf(1.0 - self.alpha / 2.0);

        let mut var = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (m, psi) in mean.iter().zip(self.psi_weights(horizon)) {
            var += psi * psi;
            let half = z * self.sigma * var.sqrt();
            lower.push(m - half);
            upper.push(m + half);
        }

        Ok(ForecastPath { mean, lower, upper })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ArimaxArtifact {
        ArimaxArtifact {
            intercept: 1.0,
            ar: vec![0.5],
            d: 0,
            exog_columns: vec!["diff_FFR".to_string()],
            exog_coefs: vec![2.0],
            sigma: 0.1,
            history: vec![3.0, 2.0],
            alpha: 0.2,
        }
    }

    #[test]
    fn mean_recursion_and_interval_width() {
        let a = artifact();
        a.validate("test").unwrap();
        let exog = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 0.0]);
        let path = a.forecast(&exog, 3).unwrap();
        // 1 + 0.5*2 = 2; 1 + 0.5*2 + 2 = 4; 1 + 0.5*4 = 3
        assert_eq!(path.mean, vec![2.0, 4.0, 3.0]);

        let z = 1.281_551_565_5;
        assert!((path.upper[0] - path.mean[0] - z * 0.1).abs() < 1e-6);
        // Var multiplier after two steps: 1 + 0.25.
        assert!((path.upper[1] - path.mean[1] - z * 0.1 * 1.25f64.sqrt()).abs() < 1e-6);
        path.validate(3).unwrap();
    }

    #[test]
    fn integrated_model_accumulates_changes() {
        let a = ArimaxArtifact {
            intercept: 0.1,
            ar: Vec::new(),
            d: 1,
            exog_columns: Vec::new(),
            exog_coefs: Vec::new(),
            sigma: 0.2,
            history: vec![4.0],
            alpha: 0.2,
        };
        a.validate("rw").unwrap();
        let path = a.forecast(&DMatrix::zeros(3, 0), 3).unwrap();
        for (m, want) in path.mean.iter().zip([4.1, 4.2, 4.3]) {
            assert!((m - want).abs() < 1e-12);
        }
        // Random walk: width grows with sqrt(h).
        assert_eq!(a.psi_weights(3), vec![1.0, 1.0, 1.0]);
        let w1 = path.upper[0] - path.mean[0];
        let w3 = path.upper[2] - path.mean[2];
        assert!((w3 / w1 - 3f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn inconsistent_artifacts_are_rejected() {
        let mut a = artifact();
        a.exog_coefs.push(1.0);
        assert!(a.validate("x").is_err());
        let mut b = artifact();
        b.history.clear();
        assert!(b.validate("x").is_err());
        let exog = DMatrix::zeros(2, 3);
        assert!(artifact().forecast(&exog, 2).is_err());
    }

    #[test]
    fn short_history_is_an_error_not_a_panic() {
        let mut a = artifact();
        a.history.clear();
        let err = a.forecast(&DMatrix::zeros(2, 1), 2).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Dispatch);
        assert!(err.message().contains("history"), "{}", err.message());
    }

    #[test]
    fn alpha_defaults_to_eighty_percent_bands() {
        let json = r#"{"intercept":0.0,"exog_columns":[],"exog_coefs":[],"sigma":1.0}"#;
        let a: ArimaxArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(a.alpha, 0.2);
        assert_eq!(a.d, 0);
        a.validate("json").unwrap();
    }
}
