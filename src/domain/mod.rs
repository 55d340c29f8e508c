//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - selection enums (`VariableGroup`, `MacroSeries`, `Cadence`)
//! - dispatch keys (`ModelType`, `Maturity`)
//! - curve parameters (`AfnsParams`) and run configuration
//! - the fixed tariff catalog

pub mod catalog;
pub mod types;

pub use catalog::TariffCategory;
pub use types::*;
