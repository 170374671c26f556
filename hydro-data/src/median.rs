//! Median statistics stepped across a time window.

use hydro_model::statistics::StatisticsSummary;
use hydro_model::TimeSeriesPoint;
use hydro_utils::dates::{date_start_millis, to_date, DateRange};
use chrono::Datelike;

/// One step point per calendar day (UTC) of `[start, end]` that has a median.
///
/// The first point is pinned to `start` so the step line begins at the left
/// edge of the window.
pub fn median_points(stats: &StatisticsSummary, start: i64, end: i64) -> Vec<TimeSeriesPoint> {
    let (first_day, last_day) = match (to_date(start), to_date(end)) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };
    DateRange(first_day, last_day)
        .filter_map(|date| {
            let p50 = stats.median_for(date.month(), date.day())?;
            let time = date_start_millis(date)?.max(start);
            Some(TimeSeriesPoint {
                time,
                value: Some(p50),
                qualifiers: Default::default(),
            })
        })
        .collect()
}
