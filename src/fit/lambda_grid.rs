//! Decay-rate grid used to seed the AFNS fit.
//!
//! The curve is linear in its three factors once λ is fixed, so a coarse
//! log-spaced λ grid with an OLS solve per point gives a deterministic starting
//! point that avoids the flat regions of the MSE surface.

use crate::error::AppError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::input(format!(
            "Invalid lambda range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::input("Lambda grid steps must be >= 2."));
    }

    let ln_min = min.ln();
    let step = (max.ln() - ln_min) / (steps as f64 - 1.0);
    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_space_includes_endpoints() {
        let v = log_space(0.01, 10.0, 61).unwrap();
        assert_eq!(v.len(), 61);
        assert!((v[0] - 0.01).abs() < 1e-12);
        assert!((v[60] - 10.0).abs() < 1e-9);
        assert!(v.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rejects_degenerate_ranges() {
        assert!(log_space(0.0, 1.0, 5).is_err());
        assert!(log_space(1.0, 1.0, 5).is_err());
        assert!(log_space(0.1, 1.0, 1).is_err());
    }
}
