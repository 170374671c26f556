use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The kinds of series a hydrograph can show.
///
/// - `Current`: instantaneous values for the selected window
/// - `Compare`: the same window one year earlier
/// - `Median`: daily median statistics stepped across the window
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Current,
    Compare,
    Median,
}

impl SeriesKind {
    /// Series kinds that carry instantaneous-value points.
    pub const IV_KINDS: [SeriesKind; 2] = [SeriesKind::Current, SeriesKind::Compare];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Current => "current",
            SeriesKind::Compare => "compare",
            SeriesKind::Median => "median",
        }
    }
}

/// A single observation: epoch-millisecond time, nullable value and qualifier codes.
///
/// A `None` value denotes a gap or a masked reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time: i64,
    pub value: Option<f64>,
    pub qualifiers: BTreeSet<String>,
}

impl TimeSeriesPoint {
    pub fn new(time: i64, value: Option<f64>, qualifiers: &[&str]) -> Self {
        TimeSeriesPoint {
            time,
            value,
            qualifiers: qualifiers.iter().map(|q| q.to_string()).collect(),
        }
    }

    /// Case-insensitive qualifier check.
    pub fn has_qualifier(&self, code: &str) -> bool {
        self.qualifiers.iter().any(|q| q.eq_ignore_ascii_case(code))
    }
}

/// A point as it arrives from the data-fetch collaborator, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPoint {
    #[serde(alias = "dateTime")]
    pub time: Option<i64>,
    pub value: Option<f64>,
    pub qualifiers: Option<Vec<String>>,
}

impl RawPoint {
    /// Validate a raw point. A missing time or qualifier list is an upstream
    /// data error, so it is rejected instead of coerced.
    pub fn into_point(self, index: usize) -> Result<TimeSeriesPoint> {
        let time = self.time.ok_or(ModelError::MalformedPoint {
            index,
            field: "time",
        })?;
        let qualifiers = self.qualifiers.ok_or(ModelError::MalformedPoint {
            index,
            field: "qualifiers",
        })?;
        Ok(TimeSeriesPoint {
            time,
            value: self.value,
            qualifiers: qualifiers.into_iter().collect(),
        })
    }
}

/// Verify that point times never decrease.
pub fn check_order(points: &[TimeSeriesPoint]) -> Result<()> {
    for (index, window) in points.windows(2).enumerate() {
        if window[1].time < window[0].time {
            return Err(ModelError::OutOfOrder {
                index: index + 1,
                previous: window[0].time,
                time: window[1].time,
            });
        }
    }
    Ok(())
}

/// A time-ascending sequence of points for one series and method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    points: Vec<TimeSeriesPoint>,
}

impl Series {
    /// Build a series, rejecting points that are out of time order.
    pub fn new(points: Vec<TimeSeriesPoint>) -> Result<Self> {
        check_order(&points)?;
        Ok(Series { points })
    }

    /// Validate and convert raw points.
    pub fn from_raw(raw: Vec<RawPoint>) -> Result<Self> {
        let points = raw
            .into_iter()
            .enumerate()
            .map(|(index, point)| point.into_point(index))
            .collect::<Result<Vec<_>>>()?;
        Series::new(points)
    }

    /// Parse a JSON array of `{time, value, qualifiers}` objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawPoint> = serde_json::from_str(json)?;
        let series = Series::from_raw(raw);
        if let Err(err) = &series {
            log::warn!("rejected series: {}", err);
        }
        series
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The same points with every non-null value passed through `convert`.
    pub fn map_values(&self, convert: impl Fn(f64) -> f64) -> Series {
        Series {
            points: self
                .points
                .iter()
                .map(|point| TimeSeriesPoint {
                    value: point.value.map(&convert),
                    ..point.clone()
                })
                .collect(),
        }
    }

    /// Points whose time lies strictly inside `(start, end)`.
    pub fn strictly_within(&self, start: i64, end: i64) -> Vec<TimeSeriesPoint> {
        self.points
            .iter()
            .filter(|point| point.time > start && point.time < end)
            .cloned()
            .collect()
    }
}
