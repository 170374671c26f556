use serde::{Deserialize, Serialize};

/// A closed numeric interval `[low, high]` with `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainRange {
    pub low: f64,
    pub high: f64,
}

impl DomainRange {
    /// Build a range from two bounds in either order.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            DomainRange { low: a, high: b }
        } else {
            DomainRange { low: b, high: a }
        }
    }

    /// The range used when an axis has nothing to show.
    pub fn unit() -> Self {
        DomainRange { low: 0.0, high: 1.0 }
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    /// Both bounds strictly above zero.
    pub fn is_positive(&self) -> bool {
        self.low > 0.0 && self.high > 0.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &DomainRange) -> DomainRange {
        DomainRange {
            low: self.low.min(other.low),
            high: self.high.max(other.high),
        }
    }

    /// Smallest range covering every supplied range, `None` if there are none.
    pub fn merge<'a, I>(ranges: I) -> Option<DomainRange>
    where
        I: IntoIterator<Item = &'a DomainRange>,
    {
        ranges
            .into_iter()
            .fold(None, |acc: Option<DomainRange>, range| match acc {
                Some(merged) => Some(merged.union(range)),
                None => Some(*range),
            })
    }

    /// Extent of the finite values in `values`.
    pub fn extent<I>(values: I) -> Option<DomainRange>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<DomainRange>, v| match acc {
                Some(range) => Some(DomainRange {
                    low: range.low.min(v),
                    high: range.high.max(v),
                }),
                None => Some(DomainRange { low: v, high: v }),
            })
    }
}

impl From<[f64; 2]> for DomainRange {
    fn from(value: [f64; 2]) -> Self {
        DomainRange::new(value[0], value[1])
    }
}
