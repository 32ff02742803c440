//! Day-level bucketing of forecast series.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};

use crate::model::{DailySummary, ForecastPoint};

/// Points shown in the hourly strip: 24 hours at 3-hour spacing.
pub const HOURLY_WINDOW: usize = 8;

/// Upper bound on emitted day summaries.
pub const MAX_DAYS: usize = 7;

/// Samples per day for series without timestamps (3-hour cadence).
pub const SAMPLES_PER_DAY: usize = 8;

const NOON_SECS: i64 = 12 * 60 * 60;

/// Reduce an ordered point series to at most `day_count` day summaries.
///
/// Points are grouped by calendar day in their own UTC offset when every point
/// has a timestamp. Otherwise they fall back to fixed buckets of
/// [`SAMPLES_PER_DAY`] in input order. Days absent from the input are never
/// synthesized, and `n` points never yield more than `ceil(n / 8)` days: a
/// series that straddles midnight keeps its earliest days.
pub fn aggregate_daily(points: &[ForecastPoint], day_count: usize) -> Vec<DailySummary> {
    let day_count = day_count.min(MAX_DAYS);

    if points.is_empty() || day_count == 0 {
        return Vec::new();
    }

    if points.iter().all(|p| p.timestamp.is_some()) {
        by_calendar_day(points, day_count)
    } else {
        by_index(points, day_count)
    }
}

/// The leading slice of the series shown as the hourly view, order unchanged.
pub fn hourly_window(points: &[ForecastPoint]) -> Vec<ForecastPoint> {
    points.iter().take(HOURLY_WINDOW).cloned().collect()
}

fn by_calendar_day(points: &[ForecastPoint], day_count: usize) -> Vec<DailySummary> {
    let day_count = day_count.min(points.len().div_ceil(SAMPLES_PER_DAY));

    let mut days: BTreeMap<NaiveDate, Vec<&ForecastPoint>> = BTreeMap::new();
    for point in points {
        if let Some(ts) = point.timestamp {
            days.entry(ts.date_naive()).or_default().push(point);
        }
    }

    days.into_iter()
        .take(day_count)
        .filter_map(|(date, group)| {
            let representative = group
                .iter()
                .copied()
                .min_by_key(|p| distance_from_noon(p))?;
            summarize(date.format("%A").to_string(), &group, representative)
        })
        .collect()
}

fn by_index(points: &[ForecastPoint], day_count: usize) -> Vec<DailySummary> {
    points
        .chunks(SAMPLES_PER_DAY)
        .take(day_count)
        .enumerate()
        .filter_map(|(index, chunk)| {
            let group: Vec<&ForecastPoint> = chunk.iter().collect();
            let first = *group.first()?;
            summarize(index_label(index), &group, first)
        })
        .collect()
}

fn summarize(
    label: String,
    group: &[&ForecastPoint],
    representative: &ForecastPoint,
) -> Option<DailySummary> {
    let high_c = group.iter().map(|p| p.temp_c).max()?;
    let low_c = group.iter().map(|p| p.temp_c).min()?;

    let humidities: Vec<u32> = group
        .iter()
        .filter_map(|p| p.humidity_pct)
        .map(u32::from)
        .collect();
    let humidity_pct = (!humidities.is_empty()).then(|| {
        let mean = humidities.iter().sum::<u32>() as f64 / humidities.len() as f64;
        mean.round() as u8
    });

    Some(DailySummary {
        label,
        high_c,
        low_c,
        condition: representative.condition.clone(),
        condition_icon: representative.condition_icon.clone(),
        humidity_pct,
        wind_kmh: group.iter().filter_map(|p| p.wind_kmh).max(),
    })
}

/// Seconds between the point's local time of day and 12:00. Ties resolve to
/// the earlier point because `min_by_key` keeps the first minimum.
fn distance_from_noon(point: &ForecastPoint) -> i64 {
    point
        .timestamp
        .map(|ts| (i64::from(ts.num_seconds_from_midnight()) - NOON_SECS).abs())
        .unwrap_or(i64::MAX)
}

fn index_label(index: usize) -> String {
    match index {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        n => format!("Day {}", n + 1),
    }
}
