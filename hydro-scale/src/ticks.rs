//! Y-axis tick generation.
//!
//! Linear axes use nice-number ticks. Symlog axes compress the low end of
//! the range, so the nice ticks leave large visual gaps near zero; those are
//! filled by repeatedly halving the smallest tick and rounding the results.

use crate::domain::ValueDomain;
use crate::format::TickFormat;
use hydro_model::DomainRange;
use itertools::Itertools;
use serde::Serialize;

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Screen width class, which bounds how many symlog ticks fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViewportClass {
    Wide,
    Narrow,
}

impl ViewportClass {
    /// Widths at or above `breakpoint` are wide.
    pub fn from_width(window_width: f64, breakpoint: f64) -> Self {
        if window_width >= breakpoint {
            ViewportClass::Wide
        } else {
            ViewportClass::Narrow
        }
    }

    /// (maximum tick count, target count after thinning)
    fn tick_limits(&self) -> (usize, usize) {
        match self {
            ViewportClass::Wide => (20, 10),
            ViewportClass::Narrow => (10, 5),
        }
    }
}

/// Tick positions, strictly increasing, plus their label format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSet {
    pub values: Vec<f64>,
    pub format: TickFormat,
}

impl TickSet {
    pub fn empty() -> Self {
        TickSet {
            values: Vec::new(),
            format: TickFormat::Integer,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.values.iter().map(|v| self.format.format(*v)).collect()
    }
}

fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -(10f64.powf(-power)) / factor
    }
}

/// Roughly `count` round-number ticks spanning `[start, stop]`.
///
/// A positive increment is a step size; a negative one is the reciprocal of
/// the step, which keeps fractional ticks exact (0.2 rather than 0.20000000000000001).
pub fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if !start.is_finite() || !stop.is_finite() || count == 0 {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let (start, stop) = if stop < start { (stop, start) } else { (start, stop) };
    let increment = tick_increment(start, stop, count);
    if increment == 0.0 || !increment.is_finite() {
        return Vec::new();
    }
    if increment > 0.0 {
        let mut r0 = (start / increment).round();
        let mut r1 = (stop / increment).round();
        if r0 * increment < start {
            r0 += 1.0;
        }
        if r1 * increment > stop {
            r1 -= 1.0;
        }
        step_values(r0, r1).map(|r| r * increment).collect()
    } else {
        let inverse = -increment;
        let mut r0 = (start * inverse).round();
        let mut r1 = (stop * inverse).round();
        if r0 / inverse < start {
            r0 += 1.0;
        }
        if r1 / inverse > stop {
            r1 -= 1.0;
        }
        step_values(r0, r1).map(|r| r / inverse).collect()
    }
}

fn step_values(r0: f64, r1: f64) -> impl Iterator<Item = f64> {
    let count = if r1 >= r0 { (r1 - r0) as i64 + 1 } else { 0 };
    (0..count).map(move |i| r0 + i as f64)
}

/// The smallest magnitude to start halving from: the negative tick closest
/// to zero when negatives are present, otherwise the smallest tick.
pub fn lowest_absolute_tick(ticks: &[f64]) -> Option<f64> {
    let negatives = ticks.iter().copied().filter(|v| *v < 0.0);
    match negatives.reduce(f64::max) {
        Some(highest_negative) => Some(highest_negative.abs()),
        None => ticks.iter().copied().reduce(f64::min),
    }
}

/// Halve (rounding up) until the value is no greater than 2, collecting each step.
pub fn halving_ticks(lowest: f64) -> Vec<f64> {
    let mut values = Vec::new();
    let mut current = lowest;
    while current > 2.0 {
        current = (current / 2.0).ceil();
        values.push(current);
    }
    values
}

/// Round each value above the domain's lower bound up to a magnitude
/// dependent multiple. Values at or below the lower bound are dropped.
pub fn round_ticks(values: &[f64], domain: DomainRange) -> Vec<f64> {
    values
        .iter()
        .filter(|value| **value > domain.low)
        .map(|value| {
            let factor = if *value > 10000.0 {
                10000.0
            } else if *value > 1000.0 {
                1000.0
            } else if *value > 100.0 {
                100.0
            } else if *value > 20.0 {
                10.0
            } else if *value > 5.0 {
                5.0
            } else {
                1.0
            };
            (value / factor).ceil() * factor
        })
        .collect()
}

/// When the axis has negative ticks, add the negation of every extra tick.
pub fn mirror_negative(ticks: &[f64], additional: Vec<f64>) -> Vec<f64> {
    if ticks.iter().any(|v| *v < 0.0) {
        additional
            .iter()
            .map(|v| -v)
            .chain(additional.iter().copied())
            .collect()
    } else {
        additional
    }
}

/// Nice ticks merged with the synthesized symlog ticks, sorted and deduplicated.
pub fn symlog_ticks(ticks: &[f64], domain: DomainRange) -> Vec<f64> {
    let additional = lowest_absolute_tick(ticks)
        .map(halving_ticks)
        .unwrap_or_default();
    let additional = round_ticks(&additional, domain);
    let additional = mirror_negative(ticks, additional);
    additional
        .into_iter()
        .chain(ticks.iter().copied())
        .sorted_by(|a, b| a.total_cmp(b))
        .dedup()
        .collect()
}

/// Keep every Nth tick, N = round(len / target), so the count approaches `target`.
pub fn thin_ticks(ticks: Vec<f64>, target: usize) -> Vec<f64> {
    let every = ((ticks.len() as f64 / target as f64).round() as usize).max(1);
    ticks
        .into_iter()
        .enumerate()
        .filter(|(index, _)| index % every == 0)
        .map(|(_, value)| value)
        .collect()
}

/// Ticks and formatter for a y axis.
///
/// A domain with no data gets an empty tick set. Symlog axes get the extra
/// gap-filling ticks and are thinned when they exceed the viewport's limit.
pub fn tick_set(domain: &ValueDomain, use_symlog: bool, viewport: ViewportClass, tick_count: usize) -> TickSet {
    if !domain.has_data() {
        return TickSet::empty();
    }
    let range = domain.range;
    let mut values: Vec<f64> = nice_ticks(range.low, range.high, tick_count)
        .into_iter()
        .sorted_by(|a, b| a.total_cmp(b))
        .dedup()
        .collect();

    if use_symlog {
        values = symlog_ticks(&values, range);
        let (limit, target) = viewport.tick_limits();
        if values.len() > limit {
            log::debug!("thinning {} symlog ticks toward {}", values.len(), target);
            values = thin_ticks(values, target);
        }
    }

    let format = TickFormat::for_values(&values);
    TickSet { values, format }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{extend_domain, DomainSource};

    fn data_domain(low: f64, high: f64) -> ValueDomain {
        ValueDomain {
            range: DomainRange::new(low, high),
            source: DomainSource::Data,
        }
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(nice_ticks(0.0, 118.0, 5), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(nice_ticks(1.0, 1000.0, 5), vec![200.0, 400.0, 600.0, 800.0, 1000.0]);
        assert_eq!(nice_ticks(-16.0, 26.0, 5), vec![-10.0, 0.0, 10.0, 20.0]);
        assert_eq!(nice_ticks(3.0, 3.0, 5), vec![3.0]);
        assert_eq!(nice_ticks(10.0, 0.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_lowest_absolute_tick() {
        assert_eq!(lowest_absolute_tick(&[200.0, 400.0]), Some(200.0));
        assert_eq!(lowest_absolute_tick(&[-400.0, -200.0, 0.0, 200.0]), Some(200.0));
        assert_eq!(lowest_absolute_tick(&[]), None);
    }

    #[test]
    fn test_halving_ticks() {
        assert_eq!(
            halving_ticks(200.0),
            vec![100.0, 50.0, 25.0, 13.0, 7.0, 4.0, 2.0]
        );
        assert!(halving_ticks(2.0).is_empty());
        assert!(halving_ticks(0.0).is_empty());
    }

    #[test]
    fn test_round_ticks() {
        let rounded = round_ticks(
            &[25000.0, 4500.0, 150.0, 25.0, 13.0, 7.0, 4.0, 2.0],
            DomainRange::new(3.0, 30000.0),
        );
        assert_eq!(rounded, vec![30000.0, 5000.0, 200.0, 30.0, 15.0, 10.0, 4.0]);
    }

    #[test]
    fn test_mirror_negative() {
        assert_eq!(
            mirror_negative(&[-100.0, 0.0, 100.0], vec![50.0, 25.0]),
            vec![-50.0, -25.0, 50.0, 25.0]
        );
        assert_eq!(mirror_negative(&[0.0, 100.0], vec![50.0]), vec![50.0]);
    }

    #[test]
    fn test_symlog_domain_synthesizes_ticks() {
        let ticks = tick_set(&data_domain(1.0, 1000.0), true, ViewportClass::Wide, 5);
        assert_eq!(
            ticks.values,
            vec![2.0, 4.0, 10.0, 15.0, 30.0, 50.0, 100.0, 200.0, 400.0, 600.0, 800.0, 1000.0]
        );
        assert!(ticks.values.iter().all(|v| *v > 0.0));
        assert_eq!(ticks.format, TickFormat::Integer);
    }

    #[test]
    fn test_symlog_ticks_with_negatives_are_mirrored() {
        let ticks = tick_set(&data_domain(-100.0, 100.0), true, ViewportClass::Wide, 5);
        // 50 halves to 25, which rounds up to 30
        assert!(ticks.values.contains(&-30.0));
        assert!(ticks.values.contains(&30.0));
        assert!(ticks.values.contains(&-2.0));
        for pair in ticks.values.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_symlog_ticks_thinned_on_narrow_viewport() {
        let domain = data_domain(1.0, 1000.0);
        let wide = tick_set(&domain, true, ViewportClass::Wide, 5);
        let narrow = tick_set(&domain, true, ViewportClass::Narrow, 5);
        assert_eq!(wide.values.len(), 12);
        // 12 ticks over the narrow limit of 10: keep every round(12 / 5) = 2nd
        assert_eq!(narrow.values, vec![2.0, 10.0, 30.0, 100.0, 400.0, 800.0]);
    }

    #[test]
    fn test_linear_ticks_not_augmented() {
        let domain = ValueDomain {
            range: extend_domain(DomainRange::new(10.0, 100.0), false),
            source: DomainSource::Data,
        };
        let ticks = tick_set(&domain, false, ViewportClass::Wide, 5);
        assert_eq!(ticks.values, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(ticks.labels(), vec!["0", "20", "40", "60", "80", "100"]);
    }

    #[test]
    fn test_fractional_ticks_use_two_decimals() {
        let ticks = tick_set(&data_domain(0.0, 1.0), false, ViewportClass::Wide, 5);
        assert_eq!(ticks.format, TickFormat::TwoDecimals);
        assert_eq!(ticks.labels()[1], "0.20");
    }

    #[test]
    fn test_no_data_gives_empty_ticks() {
        let domain = ValueDomain {
            range: DomainRange::unit(),
            source: DomainSource::Default,
        };
        assert!(tick_set(&domain, true, ViewportClass::Wide, 5).values.is_empty());
    }

    #[test]
    fn test_thin_ticks() {
        let ticks: Vec<f64> = (0..37).map(f64::from).collect();
        let thinned = thin_ticks(ticks, 10);
        assert_eq!(thinned.len(), 10);
        assert_eq!(thinned[1], 4.0);
    }
}
