//! Invariants of normalization and day aggregation over generated input.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, FixedOffset};
use forecast_core::{
    ForecastPoint, HOURLY_WINDOW, MAX_DAYS, RawObservation, aggregate_daily, hourly_window,
    normalize_observation,
};
use proptest::prelude::*;
use serde_json::json;

fn untimed(temps: &[i32]) -> Vec<ForecastPoint> {
    temps
        .iter()
        .map(|&temp_c| ForecastPoint {
            timestamp: None,
            label: String::new(),
            temp_c,
            condition: "clear".to_string(),
            condition_icon: "sun".to_string(),
            humidity_pct: None,
            wind_kmh: None,
        })
        .collect()
}

fn timed(start: DateTime<FixedOffset>, gaps_hours: &[i64], temps: &[i32]) -> Vec<ForecastPoint> {
    let mut at = start;
    gaps_hours
        .iter()
        .zip(temps)
        .map(|(&gap, &temp_c)| {
            at += Duration::hours(gap);
            ForecastPoint {
                timestamp: Some(at),
                label: String::new(),
                temp_c,
                condition: "clouds".to_string(),
                condition_icon: "cloud".to_string(),
                humidity_pct: None,
                wind_kmh: None,
            }
        })
        .collect()
}

fn midnight() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-01T00:00:00+02:00").expect("valid timestamp")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Without timestamps, n points give at most ceil(n / 8) days.
    #[test]
    fn untimed_series_bucket_count(temps in prop::collection::vec(-40i32..50, 0..24)) {
        let days = aggregate_daily(&untimed(&temps), MAX_DAYS);

        prop_assert_eq!(days.len(), temps.len().div_ceil(8));
    }

    /// A 3-hourly series never exceeds ceil(n / 8) days, whatever hour it starts at.
    #[test]
    fn three_hourly_series_bucket_count(
        temps in prop::collection::vec(-40i32..50, 0..24),
        start_hour in 0i64..24,
    ) {
        let mut gaps = vec![3i64; temps.len()];
        if let Some(first) = gaps.first_mut() {
            *first = 0;
        }
        let start = midnight() + Duration::hours(start_hour);
        let days = aggregate_daily(&timed(start, &gaps, &temps), MAX_DAYS);

        prop_assert!(days.len() <= temps.len().div_ceil(8));
    }

    /// One group per represented calendar day, within the sample budget.
    #[test]
    fn never_invents_days(
        gaps in prop::collection::vec(0i64..30, 1..40),
        seed in -30i32..30,
    ) {
        let temps: Vec<i32> = (0..gaps.len() as i32).map(|i| seed + i % 7).collect();
        let points = timed(midnight(), &gaps, &temps);
        let represented: BTreeSet<_> = points
            .iter()
            .filter_map(|p| p.timestamp.map(|ts| ts.date_naive()))
            .collect();

        let days = aggregate_daily(&points, MAX_DAYS);

        prop_assert_eq!(
            days.len(),
            represented.len().min(MAX_DAYS).min(points.len().div_ceil(8))
        );
    }

    #[test]
    fn high_is_never_below_low(
        gaps in prop::collection::vec(0i64..12, 0..60),
        temps in prop::collection::vec(-60i32..60, 60),
    ) {
        for day in aggregate_daily(&timed(midnight(), &gaps, &temps), MAX_DAYS) {
            prop_assert!(day.high_c >= day.low_c);
        }
        for day in aggregate_daily(&untimed(&temps[..gaps.len()]), MAX_DAYS) {
            prop_assert!(day.high_c >= day.low_c);
        }
    }

    #[test]
    fn hourly_window_is_a_bounded_prefix(temps in prop::collection::vec(-40i32..50, 0..40)) {
        let points = untimed(&temps);
        let window = hourly_window(&points);

        prop_assert_eq!(window.len(), temps.len().min(HOURLY_WINDOW));
        prop_assert_eq!(&window[..], &points[..window.len()]);
    }

    /// Any numeric temperature under either key yields an integer reading.
    #[test]
    fn numeric_temperature_always_normalizes(temp in -80.0f64..60.0, nested in any::<bool>()) {
        let raw: RawObservation = if nested {
            serde_json::from_value(json!({"main": {"temp": temp}}))
        } else {
            serde_json::from_value(json!({"temp": temp}))
        }
        .expect("valid raw observation");

        let obs = normalize_observation(&raw).expect("numeric temperature normalizes");
        prop_assert_eq!(obs.temp_c, temp.round() as i32);
    }

    /// Unrecognised condition text never fails and gets the default icon.
    #[test]
    fn unknown_condition_gets_default_icon(word in "[xyzq]{3,12}") {
        let raw: RawObservation = serde_json::from_value(json!({"temp": 10, "condition": word}))
            .expect("valid raw observation");

        let obs = normalize_observation(&raw).expect("condition text never fails");
        prop_assert_eq!(obs.condition_icon, "cloud_sun");
    }
}
