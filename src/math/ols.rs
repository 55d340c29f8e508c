//! Linear least squares.
//!
//! For a fixed decay rate λ the AFNS curve is linear in `(level, slope, curvature)`,
//! so the λ profile search solves
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! once per grid point. The design matrix is tall (one row per maturity, three
//! columns), so we solve via SVD; nalgebra's `QR::solve` expects square systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Loadings become nearly collinear for extreme λ; relax the tolerance stepwise.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Mean of squared differences; `None` for empty or mismatched inputs.
pub fn mean_squared_error(observed: &[f64], fitted: &[f64]) -> Option<f64> {
    if observed.is_empty() || observed.len() != fitted.len() {
        return None;
    }
    let sse: f64 = observed.iter().zip(fitted).map(|(o, f)| (o - f) * (o - f)).sum();
    Some(sse / observed.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn mse_requires_matching_lengths() {
        assert_eq!(mean_squared_error(&[1.0, 2.0], &[1.0, 4.0]), Some(2.0));
        assert_eq!(mean_squared_error(&[1.0], &[]), None);
    }
}
