use hydro_model::DomainRange;
use serde::Serialize;

/// Fraction of the raw span added to each end of a value domain.
pub const PADDING_RATIO: f64 = 0.2;

/// Where a value domain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DomainSource {
    /// Merged from at least one candidate range.
    Data,
    /// No candidates; the unit range stands in.
    Default,
}

/// An axis domain plus whether it reflects any data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueDomain {
    pub range: DomainRange,
    pub source: DomainSource,
}

impl ValueDomain {
    pub fn has_data(&self) -> bool {
        self.source == DomainSource::Data
    }
}

/// Pad `domain` by [`PADDING_RATIO`] of its span on both ends.
pub fn extend_domain(domain: DomainRange, use_log_scale: bool) -> DomainRange {
    extend_domain_by(domain, use_log_scale, PADDING_RATIO)
}

/// Pad `domain` by `padding_ratio` of its span on both ends.
///
/// For log scales on positive domains the lower bound is instead
/// `min * |ln min| / (|ln min| + 1)`, which lowers it by roughly an order of
/// magnitude of the minimum. Positive domains never get a negative lower bound.
pub fn extend_domain_by(domain: DomainRange, use_log_scale: bool, padding_ratio: f64) -> DomainRange {
    let is_positive = domain.is_positive();
    let padding = padding_ratio * domain.span();
    let mut low = domain.low - padding;
    let high = domain.high + padding;

    if use_log_scale && is_positive {
        let abs_log = domain.low.ln().abs();
        low = domain.low * abs_log / (abs_log + 1.0);
    }

    if is_positive {
        low = low.max(0.0);
    }
    DomainRange { low, high }
}

/// Merge candidate ranges and pad the result. With no candidates the domain
/// is the unit range, marked as [`DomainSource::Default`].
pub fn value_domain(candidates: &[DomainRange], use_log_scale: bool, padding_ratio: f64) -> ValueDomain {
    match DomainRange::merge(candidates) {
        Some(merged) => ValueDomain {
            range: extend_domain_by(merged, use_log_scale, padding_ratio),
            source: DomainSource::Data,
        },
        None => ValueDomain {
            range: DomainRange::unit(),
            source: DomainSource::Default,
        },
    }
}
