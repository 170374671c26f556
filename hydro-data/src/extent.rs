use hydro_model::{DomainRange, TimeSeriesPoint};

/// Range of the non-null values in `points`, `None` when there are none.
pub fn value_extent(points: &[TimeSeriesPoint]) -> Option<DomainRange> {
    DomainRange::extent(points.iter().filter_map(|point| point.value))
}
