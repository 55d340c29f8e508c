//! Property-based tests for the table engines.
//!
//! These verify invariants that should hold for every business-day range,
//! level series, event set and selection.

use chrono::{Datelike, Duration, NaiveDate};
use proptest::prelude::*;
use yield_wizard::calendar::{BusinessCalendar, UsFederalCalendar, business_days};
use yield_wizard::domain::catalog::CATALOG;
use yield_wizard::domain::{Cadence, VariableGroup};
use yield_wizard::table::FeatureTable;
use yield_wizard::table::events::{EventSet, apply_events};
use yield_wizard::table::levels::{checkpoints, differences, interpolate_levels};
use yield_wizard::table::schema::{Selection, ordered_columns, select_columns};

fn range_strategy() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0i64..700, 7i64..400).prop_map(|(offset, span)| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let start = base + Duration::days(offset);
        (start, start + Duration::days(span))
    })
}

fn group_strategy() -> impl Strategy<Value = Vec<VariableGroup>> {
    prop::sample::subsequence(VariableGroup::ALL.to_vec(), 0..=3)
}

fn tariff_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(CATALOG.iter().map(|c| c.id).collect::<Vec<_>>(), 0..=6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn business_days_strictly_increase_and_skip_weekends((start, end) in range_strategy()) {
        let days = business_days(start, end, &UsFederalCalendar);
        prop_assert!(days.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(days.iter().all(|d| d.weekday().number_from_monday() <= 5));

        if !days.is_empty() {
            let table = FeatureTable::from_dates(days.clone()).unwrap();
            prop_assert_eq!(table.dates(), &days[..]);
        }
    }

    #[test]
    fn sampling_every_day_makes_interpolation_the_identity(
        (start, end) in range_strategy(),
        seed in 0.5..50.0_f64,
    ) {
        let days = business_days(start, end, &UsFederalCalendar);
        prop_assume!(!days.is_empty());
        prop_assert_eq!(checkpoints(&days, Cadence::All), days.clone());

        let levels: Vec<f64> = (0..days.len()).map(|i| seed + (i as f64 * 0.37).sin()).collect();
        let sampled: Vec<Option<f64>> = levels.iter().copied().map(Some).collect();
        prop_assert_eq!(interpolate_levels(&days, &sampled, -1.0), levels);
    }

    #[test]
    fn differences_telescope_to_the_last_level(
        levels in prop::collection::vec(-100.0..100.0_f64, 1..300),
        baseline in -100.0..100.0_f64,
    ) {
        let d = differences(&levels, baseline);
        prop_assert_eq!(d.len(), levels.len());
        let total = baseline + d.iter().sum::<f64>();
        let last = *levels.last().unwrap();
        prop_assert!((total - last).abs() < 1e-9, "{} vs {}", total, last);
    }

    #[test]
    fn applying_events_twice_equals_applying_once(
        (start, end) in range_strategy(),
        tariffs in tariff_strategy(),
        picks in prop::collection::vec((0usize..6, 0usize..400), 0..10),
    ) {
        let days = business_days(start, end, &UsFederalCalendar);
        prop_assume!(!days.is_empty());
        let calendar = BusinessCalendar::from_days(days.clone()).unwrap();

        let selection = Selection::new(Vec::new(), tariffs.iter().copied());
        let (table, _) = select_columns(FeatureTable::from_dates(days.clone()).unwrap(), &selection).unwrap();

        let mut events = EventSet::new();
        for (t, i) in picks {
            let category = CATALOG[t].id;
            events.record(category, days[i % days.len()], &calendar).unwrap();
        }

        let once = apply_events(table, &events).unwrap();
        let twice = apply_events(once.clone(), &events).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn column_order_is_deterministic_and_canonical(
        groups in group_strategy(),
        tariffs in tariff_strategy(),
    ) {
        let forward = Selection::new(groups.iter().copied(), tariffs.iter().copied());
        let reversed = Selection::new(groups.iter().rev().copied(), tariffs.iter().rev().copied());
        let order = ordered_columns(&forward);
        prop_assert_eq!(&order, &ordered_columns(&reversed));

        let n = tariffs.len();
        let mut sorted: Vec<String> = tariffs.iter().map(|t| t.to_string()).collect();
        sorted.sort();
        prop_assert_eq!(&order[..n], &sorted[..]);

        let expected_groups: Vec<String> = VariableGroup::ALL
            .into_iter()
            .filter(|g| groups.contains(g))
            .flat_map(|g| g.columns())
            .map(str::to_string)
            .collect();
        prop_assert_eq!(&order[n..n + expected_groups.len()], &expected_groups[..]);
        prop_assert_eq!(order.len(), 3 * n + expected_groups.len());
    }
}
