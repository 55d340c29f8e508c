//! Business-day calendar for the forecast horizon.
//!
//! A business day is a Saturday/Sunday-excluded weekday that is not a US federal
//! holiday. Fixed-date holidays falling on a weekend are observed on the nearest
//! weekday (Saturday -> Friday, Sunday -> Monday).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::AppError;

/// Fixed first day of every horizon.
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 21).unwrap_or(NaiveDate::MIN)
}

/// Maximum distance (calendar days) between start and end.
pub const MAX_HORIZON_DAYS: i64 = 730;

/// Holiday rules used when generating business days.
pub trait HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool;

    fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }
}

/// US federal holiday calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsFederalCalendar;

impl HolidayCalendar for UsFederalCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        let y = date.year();
        is_observed_fixed_holiday(date, 1, 1)
            || Some(date) == nth_weekday_of_month(y, 1, Weekday::Mon, 3)
            || Some(date) == nth_weekday_of_month(y, 2, Weekday::Mon, 3)
            || Some(date) == last_weekday_of_month(y, 5, Weekday::Mon)
            || (y >= 2021 && is_observed_fixed_holiday(date, 6, 19))
            || is_observed_fixed_holiday(date, 7, 4)
            || Some(date) == nth_weekday_of_month(y, 9, Weekday::Mon, 1)
            || Some(date) == nth_weekday_of_month(y, 10, Weekday::Mon, 2)
            || is_observed_fixed_holiday(date, 11, 11)
            || Some(date) == nth_weekday_of_month(y, 11, Weekday::Thu, 4)
            || is_observed_fixed_holiday(date, 12, 25)
    }
}

/// Ordered set of valid dates in a horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessCalendar {
    days: Vec<NaiveDate>,
}

impl BusinessCalendar {
    /// Build the calendar for `[start, end]`, validating the horizon length.
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        holidays: &impl HolidayCalendar,
    ) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::input(format!(
                "End date {end} is before the start date {start}."
            )));
        }
        if (end - start).num_days() > MAX_HORIZON_DAYS {
            return Err(AppError::input(format!(
                "End date {end} is more than {MAX_HORIZON_DAYS} days after {start}."
            )));
        }
        Ok(Self {
            days: business_days(start, end, holidays),
        })
    }

    /// Wrap an explicit day list (must be strictly increasing).
    pub fn from_days(days: Vec<NaiveDate>) -> Result<Self, AppError> {
        if !days.windows(2).all(|w| w[0] < w[1]) {
            return Err(AppError::input("Business days must be strictly increasing."));
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.binary_search(&date).is_ok()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.days.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }
}

/// Ascending business days in `[start, end]`.
pub fn business_days(start: NaiveDate, end: NaiveDate, holidays: &impl HolidayCalendar) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut d = start;
    while d <= end {
        if holidays.is_business_day(d) {
            out.push(d);
        }
        match d.succ_opt() {
            Some(next) => d = next,
            None => break,
        }
    }
    out
}

fn is_observed_fixed_holiday(date: NaiveDate, month: u32, day: u32) -> bool {
    // New Year's Day on a Saturday is observed on Dec 31 of the previous year.
    for y in [date.year() - 1, date.year(), date.year() + 1] {
        let Some(actual) = NaiveDate::from_ymd_opt(y, month, day) else {
            continue;
        };
        let observed = match actual.weekday() {
            Weekday::Sat => actual - Duration::days(1),
            Weekday::Sun => actual + Duration::days(1),
            _ => actual,
        };
        if date == observed {
            return true;
        }
    }
    false
}

fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n as u8)
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let mut d = NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()?;
    while d.weekday() != weekday {
        d = d.pred_opt()?;
    }
    Some(d)
}
