//! `yield-wizard` library crate.
//!
//! The binary (`yw`) is a thin wrapper around this library so that:
//!
//! - the wizard steps are testable without spawning processes
//! - the table, forecast and curve layers are reusable from other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod calendar;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod session;
pub mod table;
