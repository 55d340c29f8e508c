//! Stable Nelson–Siegel loadings in decay-rate form.
//!
//! With `x = λτ`:
//!
//! - `B1(τ, λ) = (1 - exp(-x)) / x`
//! - `B2(τ, λ) = B1(τ, λ) - exp(-x)`
//!
//! Numerical notes:
//! - For small `x`, `1 - exp(-x)` suffers from catastrophic cancellation, so we use
//!   `expm1` and a series fallback.
//! - For `τ → 0` the limits are `B1 → 1` and `B2 → 0`.

use crate::domain::AfnsParams;

/// Epsilon for guarding against `τ = 0` in basis evaluation.
const T_EPS: f64 = 1e-12;

/// Threshold below which we switch to a small-x series approximation.
const SMALL_X: f64 = 1e-6;

/// Slope loading `B1(τ, λ)`.
pub fn b1(tau: f64, lambda: f64) -> f64 {
    let x = tau.max(T_EPS) * lambda;
    if x.abs() < SMALL_X {
        // (1 - e^{-x}) / x ≈ 1 - x/2 + x^2/6
        return 1.0 - x / 2.0 + (x * x) / 6.0;
    }
    -(-x).exp_m1() / x
}

/// Curvature loading `B2(τ, λ)`.
pub fn b2(tau: f64, lambda: f64) -> f64 {
    let x = tau.max(T_EPS) * lambda;
    if x.abs() < SMALL_X {
        // B1 - e^{-x} ≈ x/2 - x^2/3
        return x / 2.0 - (x * x) / 3.0;
    }
    b1(tau, lambda) - (-x).exp()
}

/// `∂B1/∂λ = (e^{-x} - B1) / λ`.
pub fn db1_dlambda(tau: f64, lambda: f64) -> f64 {
    let tau = tau.max(T_EPS);
    let x = tau * lambda;
    if x.abs() < SMALL_X {
        // τ · d/dx (1 - x/2 + x^2/6)
        return tau * (-0.5 + x / 3.0);
    }
    ((-x).exp() - b1(tau, lambda)) / lambda
}

/// `∂B2/∂λ = ∂B1/∂λ + τ e^{-x}`.
pub fn db2_dlambda(tau: f64, lambda: f64) -> f64 {
    let tau = tau.max(T_EPS);
    db1_dlambda(tau, lambda) + tau * (-tau * lambda).exp()
}

/// Model yield at maturity `tau`.
pub fn afns_yield(params: &AfnsParams, tau: f64) -> f64 {
    params.level + params.slope * b1(tau, params.lambda) + params.curvature * b2(tau, params.lambda)
}
