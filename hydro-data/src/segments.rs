//! Partitioning a series into runs that share a quality mask.

use hydro_model::error::{ModelError, Result};
use hydro_model::{MaskTable, QualityMask, TimeSeriesPoint};
use serde::Serialize;

/// A maximal run of contiguous points sharing one mask classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub points: Vec<TimeSeriesPoint>,
    pub mask: Option<QualityMask>,
}

impl Segment {
    /// Single-point segments are drawn as a marker instead of a line.
    pub fn is_single_point(&self) -> bool {
        self.points.len() == 1
    }

    /// True when the segment hides its readings (not merely estimated).
    pub fn is_masked(&self) -> bool {
        self.mask.map_or(false, |mask| mask.is_data_mask())
    }

    /// First and last point times.
    pub fn time_span(&self) -> Option<(i64, i64)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }
}

/// Split `points` into segments in a single pass.
///
/// A new segment starts whenever a point's mask differs from the running
/// segment's. Every input point lands in exactly one segment, in order, and
/// single-point segments are kept. Points out of time order are rejected.
pub fn build_segments(points: &[TimeSeriesPoint], table: &MaskTable) -> Result<Vec<Segment>> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut previous_time: Option<i64> = None;

    for (index, point) in points.iter().enumerate() {
        if let Some(previous) = previous_time {
            if point.time < previous {
                log::warn!("segment builder rejected point {} at {}", index, point.time);
                return Err(ModelError::OutOfOrder {
                    index,
                    previous,
                    time: point.time,
                });
            }
        }
        previous_time = Some(point.time);

        let mask = table.classify(point);
        match segments.last_mut() {
            Some(current) if current.mask == mask => current.points.push(point.clone()),
            _ => segments.push(Segment {
                points: vec![point.clone()],
                mask,
            }),
        }
    }

    Ok(segments)
}

/// Distinct data masks present in `segments`, in first-seen order.
pub fn distinct_data_masks<'a, I>(segments: I) -> Vec<QualityMask>
where
    I: IntoIterator<Item = &'a Segment>,
{
    let mut masks = Vec::new();
    for mask in segments.into_iter().filter_map(|segment| segment.mask) {
        if mask.is_data_mask() && !masks.contains(&mask) {
            masks.push(mask);
        }
    }
    masks
}
