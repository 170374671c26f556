use hydro_model::DomainRange;
use serde::Serialize;

/// Constant of the symmetric-log transform.
pub const SYMLOG_CONSTANT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScaleKind {
    Linear,
    Symlog,
}

/// Maps values in `domain` onto the pixel interval `range`.
///
/// `range` may be inverted (y axes run from the bottom pixel up to zero).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueScale {
    pub kind: ScaleKind,
    pub domain: DomainRange,
    /// (start, end) pixels; not reordered.
    pub range: (f64, f64),
}

fn symlog(x: f64) -> f64 {
    x.signum() * (x.abs() / SYMLOG_CONSTANT).ln_1p()
}

fn symlog_inverse(y: f64) -> f64 {
    y.signum() * y.abs().exp_m1() * SYMLOG_CONSTANT
}

impl ValueScale {
    pub fn linear(domain: DomainRange, range: (f64, f64)) -> Self {
        ValueScale {
            kind: ScaleKind::Linear,
            domain,
            range,
        }
    }

    pub fn symlog(domain: DomainRange, range: (f64, f64)) -> Self {
        ValueScale {
            kind: ScaleKind::Symlog,
            domain,
            range,
        }
    }

    fn transform(&self, value: f64) -> f64 {
        match self.kind {
            ScaleKind::Linear => value,
            ScaleKind::Symlog => symlog(value),
        }
    }

    fn untransform(&self, value: f64) -> f64 {
        match self.kind {
            ScaleKind::Linear => value,
            ScaleKind::Symlog => symlog_inverse(value),
        }
    }

    /// Pixel position of `value`. A zero-width domain maps to the middle of the range.
    pub fn scale(&self, value: f64) -> f64 {
        let d0 = self.transform(self.domain.low);
        let d1 = self.transform(self.domain.high);
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        let t = (self.transform(value) - d0) / (d1 - d0);
        r0 + t * (r1 - r0)
    }

    /// Value at pixel position `pixel`.
    pub fn invert(&self, pixel: f64) -> f64 {
        let d0 = self.transform(self.domain.low);
        let d1 = self.transform(self.domain.high);
        let (r0, r1) = self.range;
        if r1 == r0 {
            return self.untransform((d0 + d1) / 2.0);
        }
        let t = (pixel - r0) / (r1 - r0);
        self.untransform(d0 + t * (d1 - d0))
    }
}
