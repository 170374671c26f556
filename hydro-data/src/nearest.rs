use hydro_model::TimeSeriesPoint;

/// The point whose time is closest to `time`, or `None` for an empty slice.
///
/// `points` must be time-ascending (as guaranteed by `Series`). When `time`
/// is exactly halfway between two neighbours the earlier point wins.
pub fn nearest_time(points: &[TimeSeriesPoint], time: i64) -> Option<&TimeSeriesPoint> {
    // first index whose time is >= the query
    let index = points.partition_point(|point| point.time < time);
    if index == 0 {
        return points.first();
    }
    if index == points.len() {
        return points.last();
    }
    let before = &points[index - 1];
    let after = &points[index];
    if time - before.time <= after.time - time {
        Some(before)
    } else {
        Some(after)
    }
}
