//! Forecaster dispatch and forecast retrieval.
//!
//! The core only depends on the `Forecaster` / `ArtifactStore` traits; the ARIMAX
//! JSON artifact and the directory loader are one implementation behind them.

pub mod arima;
pub mod dispatch;
pub mod forecast;
pub mod store;

pub use arima::ArimaxArtifact;
pub use dispatch::{
    ForecasterHandle, artifact_name, dispatch, forecast_all, forecast_maturity, model_type_for,
    model_type_for_columns,
};
pub use forecast::{
    ArtifactStore, ForecastPath, ForecastPoint, ForecastSeries, Forecaster, align_columns, forecast,
    forecast_at, row_for_date,
};
pub use store::{DirectoryStore, MemoryStore};
