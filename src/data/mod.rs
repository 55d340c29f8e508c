//! Demo data: synthetic forecaster artifacts and a matching scenario.

pub mod synthetic;

pub use synthetic::*;
