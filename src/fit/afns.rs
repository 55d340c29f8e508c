//! AFNS curve fitting.
//!
//! Minimizes the mean squared error between observed yields and
//!
//! ```text
//! y(τ) = level + slope·B1(τ, λ) + curvature·B2(τ, λ)
//! ```
//!
//! subject to box bounds on all four parameters.
//!
//! The search has two stages:
//! 1. seed: the fixed initial guess `[mean(y), -1, 1, 0.5]` competes with a λ
//!    profile (OLS factors on a log-spaced λ grid); the lower MSE wins
//! 2. refine: projected Levenberg–Marquardt with the analytic Jacobian
//!
//! Running out of iterations is reported as a numerical failure rather than
//! returning the last iterate.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::AfnsParams;
use crate::error::AppError;
use crate::fit::lambda_grid::log_space;
use crate::math::{afns_yield, b1, b2, db1_dlambda, db2_dlambda, mean_squared_error, solve_least_squares};

/// Box bounds for `[level, slope, curvature, lambda]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitBounds {
    pub lower: [f64; 4],
    pub upper: [f64; 4],
}

impl Default for FitBounds {
    fn default() -> Self {
        Self {
            lower: [-10.0, -10.0, -10.0, 0.01],
            upper: [10.0, 10.0, 10.0, 10.0],
        }
    }
}

impl FitBounds {
    fn clamp(&self, x: [f64; 4]) -> [f64; 4] {
        let mut out = x;
        for i in 0..4 {
            out[i] = x[i].clamp(self.lower[i], self.upper[i]);
        }
        out
    }

    fn contains(&self, x: &[f64; 4]) -> bool {
        (0..4).all(|i| x[i] >= self.lower[i] && x[i] <= self.upper[i])
    }
}

#[derive(Debug, Clone)]
pub struct FitOptions {
    pub bounds: FitBounds,
    pub max_iter: usize,
    /// Points in the λ seed grid.
    pub grid_steps: usize,
    /// Relative SSE reduction below which the fit is converged.
    pub ftol: f64,
    /// Projected gradient norm below which the fit is converged.
    pub gtol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            bounds: FitBounds::default(),
            max_iter: 500,
            grid_steps: 61,
            ftol: 1e-12,
            gtol: 1e-10,
        }
    }
}

/// A converged AFNS fit.
#[derive(Debug, Clone, PartialEq)]
pub struct AfnsFit {
    pub params: AfnsParams,
    pub fitted_yields: Vec<f64>,
    pub mse: f64,
    pub iterations: usize,
}

/// Fit with default bounds and tolerances.
pub fn fit(maturities: &[f64], yields: &[f64]) -> Result<AfnsFit, AppError> {
    fit_with(maturities, yields, &FitOptions::default())
}

pub fn fit_with(maturities: &[f64], yields: &[f64], opts: &FitOptions) -> Result<AfnsFit, AppError> {
    validate(maturities, yields)?;
    let bounds = opts.bounds;

    let mean = yields.iter().sum::<f64>() / yields.len() as f64;
    let guess = bounds.clamp([mean, -1.0, 1.0, 0.5]);
    let mut start = guess;
    let mut start_sse = sse(maturities, yields, &guess);
    if let Some((x, s)) = profile_seed(maturities, yields, opts)? {
        if s < start_sse {
            start = x;
            start_sse = s;
        }
    }
    debug!(seed = ?start, sse = start_sse, "afns seed");

    let (x, iterations) = levenberg_marquardt(maturities, yields, start, opts)?;
    let params = AfnsParams::from_array(x);
    let fitted_yields: Vec<f64> = maturities.iter().map(|&t| afns_yield(&params, t)).collect();
    let mse = mean_squared_error(yields, &fitted_yields)
        .filter(|m| m.is_finite())
        .ok_or_else(|| AppError::numerical("AFNS fit produced a non-finite error."))?;

    debug!(?params, mse, iterations, "afns fit converged");
    Ok(AfnsFit {
        params,
        fitted_yields,
        mse,
        iterations,
    })
}

fn validate(maturities: &[f64], yields: &[f64]) -> Result<(), AppError> {
    if maturities.len() != yields.len() {
        return Err(AppError::input(format!(
            "Got {} maturities but {} yields.",
            maturities.len(),
            yields.len()
        )));
    }
    if maturities.len() < 4 {
        return Err(AppError::input(format!(
            "At least 4 observations are needed to fit 4 parameters (got {}).",
            maturities.len()
        )));
    }
    if let Some(t) = maturities.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
        return Err(AppError::input(format!("Maturities must be finite and > 0 (got {t}).")));
    }
    if yields.iter().any(|y| !y.is_finite()) {
        return Err(AppError::input("Yields must be finite."));
    }
    Ok(())
}

fn residuals(tau: &[f64], y: &[f64], x: &[f64; 4]) -> DVector<f64> {
    let p = AfnsParams::from_array(*x);
    DVector::from_iterator(tau.len(), tau.iter().zip(y).map(|(&t, &yo)| afns_yield(&p, t) - yo))
}

fn sse(tau: &[f64], y: &[f64], x: &[f64; 4]) -> f64 {
    residuals(tau, y, x).norm_squared()
}

fn jacobian(tau: &[f64], x: &[f64; 4]) -> DMatrix<f64> {
    let [_, slope, curvature, lambda] = *x;
    DMatrix::from_fn(tau.len(), 4, |i, j| {
        let t = tau[i];
        match j {
            0 => 1.0,
            1 => b1(t, lambda),
            2 => b2(t, lambda),
            _ => slope * db1_dlambda(t, lambda) + curvature * db2_dlambda(t, lambda),
        }
    })
}

/// Best in-bounds λ profile point: `(params, sse)`.
fn profile_seed(tau: &[f64], y: &[f64], opts: &FitOptions) -> Result<Option<([f64; 4], f64)>, AppError> {
    let grid = log_space(opts.bounds.lower[3], opts.bounds.upper[3], opts.grid_steps)?;
    let yv = DVector::from_column_slice(y);
    let mut best: Option<([f64; 4], f64)> = None;
    for lambda in grid {
        let design = DMatrix::from_fn(tau.len(), 3, |i, j| match j {
            0 => 1.0,
            1 => b1(tau[i], lambda),
            _ => b2(tau[i], lambda),
        });
        let Some(beta) = solve_least_squares(&design, &yv) else {
            continue;
        };
        let x = [beta[0], beta[1], beta[2], lambda];
        if !opts.bounds.contains(&x) {
            continue;
        }
        let s = sse(tau, y, &x);
        if s.is_finite() && best.is_none_or(|(_, b)| s < b) {
            best = Some((x, s));
        }
    }
    Ok(best)
}

fn projected_gradient_norm(x: &[f64; 4], g: &DVector<f64>, bounds: &FitBounds) -> f64 {
    let mut acc = 0.0;
    for i in 0..4 {
        let blocked_low = x[i] <= bounds.lower[i] && g[i] > 0.0;
        let blocked_high = x[i] >= bounds.upper[i] && g[i] < 0.0;
        if !(blocked_low || blocked_high) {
            acc += g[i] * g[i];
        }
    }
    acc.sqrt()
}

fn levenberg_marquardt(
    tau: &[f64],
    y: &[f64],
    start: [f64; 4],
    opts: &FitOptions,
) -> Result<([f64; 4], usize), AppError> {
    let bounds = opts.bounds;
    let mut x = start;
    let mut r = residuals(tau, y, &x);
    let mut cost = r.norm_squared();
    let mut mu = 1e-3;

    for iter in 1..=opts.max_iter {
        if !cost.is_finite() {
            return Err(AppError::numerical("AFNS objective became non-finite."));
        }
        let j = jacobian(tau, &x);
        let jt = j.transpose();
        let g = &jt * &r;
        let jtj = &jt * &j;

        if projected_gradient_norm(&x, &g, &bounds) < opts.gtol {
            return Ok((x, iter));
        }

        loop {
            let mut a = jtj.clone();
            for i in 0..4 {
                a[(i, i)] += mu * jtj[(i, i)].max(1e-12);
            }
            let step = a.cholesky().map(|c| c.solve(&(-&g)));
            let Some(step) = step.filter(|s| s.iter().all(|v| v.is_finite())) else {
                mu *= 10.0;
                if mu > 1e16 {
                    return Err(AppError::numerical("AFNS normal equations are singular."));
                }
                continue;
            };

            let candidate = bounds.clamp([x[0] + step[0], x[1] + step[1], x[2] + step[2], x[3] + step[3]]);
            let r_new = residuals(tau, y, &candidate);
            let cost_new = r_new.norm_squared();

            if cost_new.is_finite() && cost_new < cost {
                let reduction = (cost - cost_new) / cost.max(f64::MIN_POSITIVE);
                x = candidate;
                r = r_new;
                cost = cost_new;
                mu = (mu / 3.0).max(1e-12);
                if reduction < opts.ftol || cost < 1e-24 {
                    return Ok((x, iter));
                }
                break;
            }

            mu *= 4.0;
            if mu > 1e16 {
                // No improving step exists inside the bounds: stationary point.
                return Ok((x, iter));
            }
        }
    }

    Err(AppError::numerical(format!(
        "AFNS fit did not converge within {} iterations.",
        opts.max_iter
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAU: [f64; 7] = [1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0];

    #[test]
    fn fits_reference_curve() {
        let yields = [4.9, 4.8, 4.7, 4.5, 4.2, 4.1, 4.0];
        let out = fit(&TAU, &yields).unwrap();
        assert!(out.mse < 1e-3, "mse {}", out.mse);
        assert_eq!(out.fitted_yields.len(), TAU.len());
        assert!(FitBounds::default().contains(&out.params.to_array()));
    }

    #[test]
    fn recovers_exact_parameters() {
        let truth = AfnsParams {
            level: 4.2,
            slope: -1.5,
            curvature: 2.0,
            lambda: 0.6,
        };
        let yields: Vec<f64> = TAU.iter().map(|&t| afns_yield(&truth, t)).collect();
        let out = fit(&TAU, &yields).unwrap();
        assert!(out.mse < 1e-8, "mse {}", out.mse);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(fit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(fit(&[1.0, 2.0, 3.0, 0.0], &[1.0, 2.0, 3.0, 4.0]).is_err());
        assert!(fit(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn iteration_cap_is_a_numerical_failure() {
        let yields = [4.9, 5.3, 4.1, 4.8, 3.0, 4.9, 2.0];
        let opts = FitOptions {
            max_iter: 0,
            ..FitOptions::default()
        };
        let err = fit_with(&TAU, &yields, &opts).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Numerical);
    }
}
