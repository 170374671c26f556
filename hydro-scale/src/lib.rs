//! Axis computation for hydrograph charts.
//!
//! - `domain`: merging candidate value ranges and padding them into an axis domain
//! - `ticks`: nice-number ticks plus the extra ticks symlog axes need
//! - `format`: the tick label formatter
//! - `scale`: linear and symmetric-log value to pixel mappings

pub mod domain;
pub mod format;
pub mod scale;
pub mod ticks;

pub use domain::{extend_domain, value_domain, DomainSource, ValueDomain};
pub use format::TickFormat;
pub use scale::{ScaleKind, ValueScale};
pub use ticks::{tick_set, TickSet, ViewportClass};
