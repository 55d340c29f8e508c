//! Input/output helpers.
//!
//! - historical CSV ingest (`history`)
//! - scenario JSON documents (`scenario`)
//! - forecast/table CSV exports (`export`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod history;
pub mod scenario;

pub use curve::*;
pub use export::*;
pub use history::*;
pub use scenario::*;
