//! Shared domain types.
//!
//! These types are intentionally small and serializable so they can be:
//!
//! - read from scenario files
//! - parsed from CLI flags (`ValueEnum`)
//! - exported alongside forecasts and curve fits

use std::path::PathBuf;

use chrono::{Datelike, Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Name of the key column of the feature table.
pub const DATE_COLUMN: &str = "Business Day";

/// Optional macro-variable groups a user can include.
///
/// Declaration order is the canonical column priority:
/// Inflation/FFR, then Sentiment/VIX, then M1 supply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum VariableGroup {
    InflationFfr,
    SentimentVix,
    M1Supply,
}

impl VariableGroup {
    pub const ALL: [VariableGroup; 3] = [
        VariableGroup::InflationFfr,
        VariableGroup::SentimentVix,
        VariableGroup::M1Supply,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            VariableGroup::InflationFfr => "Inflation / FFR",
            VariableGroup::SentimentVix => "Consumer Sentiment / VIX",
            VariableGroup::M1Supply => "M1 Supply",
        }
    }

    /// Series entered for this group, in column sub-order.
    pub fn series(self) -> &'static [MacroSeries] {
        match self {
            VariableGroup::InflationFfr => &[MacroSeries::Ffr, MacroSeries::Cpi],
            VariableGroup::SentimentVix => &[MacroSeries::Vix, MacroSeries::ConsumerSentiment],
            VariableGroup::M1Supply => &[MacroSeries::M1Supply],
        }
    }

    /// Feature-table columns contributed by this group, in sub-order.
    pub fn columns(self) -> Vec<&'static str> {
        self.series().iter().map(|s| s.column()).collect()
    }
}

/// How a user-entered level series is stored in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesTransform {
    /// Day-over-day change against the previous row (or the baseline for row 0).
    Delta,
    /// Interpolated level, stored as-is.
    Level,
}

/// A single user-entered macro series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MacroSeries {
    Ffr,
    Cpi,
    Vix,
    ConsumerSentiment,
    M1Supply,
}

impl MacroSeries {
    pub fn column(self) -> &'static str {
        match self {
            MacroSeries::Ffr => "diff_FFR",
            MacroSeries::Cpi => "diff_CPI",
            MacroSeries::Vix => "VIX_close",
            MacroSeries::ConsumerSentiment => "diff_CSD",
            MacroSeries::M1Supply => "diff_M1_supply",
        }
    }

    pub fn transform(self) -> SeriesTransform {
        match self {
            MacroSeries::Vix => SeriesTransform::Level,
            _ => SeriesTransform::Delta,
        }
    }

    pub fn group(self) -> VariableGroup {
        match self {
            MacroSeries::Ffr | MacroSeries::Cpi => VariableGroup::InflationFfr,
            MacroSeries::Vix | MacroSeries::ConsumerSentiment => VariableGroup::SentimentVix,
            MacroSeries::M1Supply => VariableGroup::M1Supply,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MacroSeries::Ffr => "FFR",
            MacroSeries::Cpi => "Inflation",
            MacroSeries::Vix => "VIX",
            MacroSeries::ConsumerSentiment => "Consumer Sentiment",
            MacroSeries::M1Supply => "M1 Supply",
        }
    }
}

/// Sampling cadence for level entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Cadence {
    TwoWeeks,
    HalfMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
    All,
}

impl Cadence {
    pub const ALL: [Cadence; 6] = [
        Cadence::TwoWeeks,
        Cadence::HalfMonth,
        Cadence::ThreeMonths,
        Cadence::SixMonths,
        Cadence::TwelveMonths,
        Cadence::All,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Cadence::TwoWeeks => "2 weeks",
            Cadence::HalfMonth => "Half month",
            Cadence::ThreeMonths => "3 months",
            Cadence::SixMonths => "6 months",
            Cadence::TwelveMonths => "12 months",
            Cadence::All => "All",
        }
    }

    /// Advance `date` by one cadence step. `None` for `All` (every row is sampled).
    pub fn step(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Cadence::TwoWeeks => Some(date + Duration::days(14)),
            Cadence::HalfMonth => Some(date + Duration::days(15)),
            Cadence::ThreeMonths => Some(add_months(date, 3)),
            Cadence::SixMonths => Some(add_months(date, 6)),
            Cadence::TwelveMonths => Some(add_months(date, 12)),
            Cadence::All => None,
        }
    }
}

/// Calendar-month addition with end-of-month clamping.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.month0() + months;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Bond maturities with a pre-trained forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Maturity {
    Y2,
    Y3,
    Y5,
    Y7,
    Y10,
    Y20,
}

impl Maturity {
    pub const ALL: [Maturity; 6] = [
        Maturity::Y2,
        Maturity::Y3,
        Maturity::Y5,
        Maturity::Y7,
        Maturity::Y10,
        Maturity::Y20,
    ];

    pub fn years(self) -> u32 {
        match self {
            Maturity::Y2 => 2,
            Maturity::Y3 => 3,
            Maturity::Y5 => 5,
            Maturity::Y7 => 7,
            Maturity::Y10 => 10,
            Maturity::Y20 => 20,
        }
    }
}

impl TryFrom<u32> for Maturity {
    type Error = AppError;

    fn try_from(years: u32) -> Result<Self, Self::Error> {
        Maturity::ALL
            .into_iter()
            .find(|m| m.years() == years)
            .ok_or_else(|| {
                AppError::input(format!(
                    "Unsupported maturity {years}y (expected one of 2, 3, 5, 7, 10, 20)."
                ))
            })
    }
}

impl From<Maturity> for u32 {
    fn from(value: Maturity) -> Self {
        value.years()
    }
}

/// Forecaster variant, determined by which optional groups are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    All,
    FfrCpiVixCs,
    FfrCpiM1,
    VixCsM1,
    FfrCpi,
    VixCs,
    M1,
    TariffsOnly,
}

impl ModelType {
    pub const ALL: [ModelType; 8] = [
        ModelType::All,
        ModelType::FfrCpiVixCs,
        ModelType::FfrCpiM1,
        ModelType::VixCsM1,
        ModelType::FfrCpi,
        ModelType::VixCs,
        ModelType::M1,
        ModelType::TariffsOnly,
    ];

    /// Resolve from group presence flags. Every combination maps to exactly one type.
    pub fn from_flags(ffr_cpi: bool, vix_cs: bool, m1: bool) -> Self {
        match (ffr_cpi, vix_cs, m1) {
            (true, true, true) => ModelType::All,
            (true, true, false) => ModelType::FfrCpiVixCs,
            (true, false, true) => ModelType::FfrCpiM1,
            (false, true, true) => ModelType::VixCsM1,
            (true, false, false) => ModelType::FfrCpi,
            (false, true, false) => ModelType::VixCs,
            (false, false, true) => ModelType::M1,
            (false, false, false) => ModelType::TariffsOnly,
        }
    }

    pub fn from_groups<'a>(groups: impl IntoIterator<Item = &'a VariableGroup>) -> Self {
        let (mut ffr, mut vix, mut m1) = (false, false, false);
        for g in groups {
            match g {
                VariableGroup::InflationFfr => ffr = true,
                VariableGroup::SentimentVix => vix = true,
                VariableGroup::M1Supply => m1 = true,
            }
        }
        Self::from_flags(ffr, vix, m1)
    }

    /// Groups included in this model type, in canonical priority order.
    pub fn groups(self) -> Vec<VariableGroup> {
        VariableGroup::ALL
            .into_iter()
            .filter(|g| match g {
                VariableGroup::InflationFfr => {
                    matches!(self, ModelType::All | ModelType::FfrCpiVixCs | ModelType::FfrCpiM1 | ModelType::FfrCpi)
                }
                VariableGroup::SentimentVix => {
                    matches!(self, ModelType::All | ModelType::FfrCpiVixCs | ModelType::VixCsM1 | ModelType::VixCs)
                }
                VariableGroup::M1Supply => {
                    matches!(self, ModelType::All | ModelType::FfrCpiM1 | ModelType::VixCsM1 | ModelType::M1)
                }
            })
            .collect()
    }

    /// Artifact file-name suffix. `None` for tariffs-only models.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            ModelType::All => Some("all"),
            ModelType::FfrCpiVixCs => Some("ffr_cpi_vix_cs"),
            ModelType::FfrCpiM1 => Some("ffr_cpi_m1"),
            ModelType::VixCsM1 => Some("vix_cs_m1"),
            ModelType::FfrCpi => Some("ffr_cpi"),
            ModelType::VixCs => Some("vix_cs"),
            ModelType::M1 => Some("m1"),
            ModelType::TariffsOnly => None,
        }
    }

    pub fn label(self) -> &'static str {
        self.suffix().unwrap_or("tariffs_only")
    }
}

/// AFNS curve parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AfnsParams {
    pub level: f64,
    pub slope: f64,
    pub curvature: f64,
    pub lambda: f64,
}

impl AfnsParams {
    pub fn to_array(self) -> [f64; 4] {
        [self.level, self.slope, self.curvature, self.lambda]
    }

    pub fn from_array(x: [f64; 4]) -> Self {
        Self {
            level: x[0],
            slope: x[1],
            curvature: x[2],
            lambda: x[3],
        }
    }
}

/// Row frequency of the exogenous matrix handed to forecasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Monthly,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scenario_path: PathBuf,
    pub models_dir: PathBuf,
    pub frequency: Frequency,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_forecast: Option<PathBuf>,
    pub export_table: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_months_clamps_to_month_end() {
        let d = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        assert_eq!(add_months(d, 6), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(add_months(d, 3), NaiveDate::from_ymd_opt(2025, 11, 30).unwrap());
        assert_eq!(add_months(d, 12), NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
    }

    #[test]
    fn every_flag_combination_maps_to_a_distinct_model_type() {
        let mut seen = Vec::new();
        for ffr in [false, true] {
            for vix in [false, true] {
                for m1 in [false, true] {
                    let t = ModelType::from_flags(ffr, vix, m1);
                    assert!(!seen.contains(&t));
                    seen.push(t);
                    assert_eq!(ModelType::from_groups(&t.groups()), t);
                }
            }
        }
        assert_eq!(seen.len(), ModelType::ALL.len());
    }

    #[test]
    fn maturity_rejects_unknown_terms() {
        assert_eq!(Maturity::try_from(10).unwrap(), Maturity::Y10);
        assert!(Maturity::try_from(30).is_err());
    }
}
