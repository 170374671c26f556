//! Data processing for hydrologic observation series.
//!
//! This crate turns validated series into the pieces a chart draws:
//! quality-mask segments, the point nearest a cursor time, value extents
//! and median step points for a window.

pub mod extent;
pub mod median;
pub mod nearest;
pub mod segments;

pub use nearest::nearest_time;
pub use segments::{build_segments, Segment};
