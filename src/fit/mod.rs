//! Yield-curve parametrization.
//!
//! Responsibilities:
//!
//! - generate the λ seed grid
//! - fit AFNS parameters to a maturity/yield set
//! - compare two fits and explain the differences

pub mod afns;
pub mod explain;
pub mod lambda_grid;

pub use afns::{AfnsFit, FitBounds, FitOptions, fit, fit_with};
pub use explain::{
    ExplainThresholds, Explanation, Factor, NO_SIGNIFICANT_CHANGE, compare_and_explain, explain,
};
pub use lambda_grid::log_space;
