//! Core types for hydrologic observations.
//!
//! - `point`: observation points, raw-input validation and ordered series
//! - `mask`: qualifier codes and the quality-mask classification table
//! - `parameter`: parameter and method reference metadata
//! - `statistics`: daily median statistics and the RDB codec that carries them
//! - `flood`: flood stage levels for gage-height charts
//! - `range`: numeric value ranges shared by extents and axis domains
//! - `temperature`: Fahrenheit companions for Celsius parameters

pub mod error;
pub mod flood;
pub mod mask;
pub mod parameter;
pub mod point;
pub mod range;
pub mod statistics;
pub mod temperature;

pub use error::{ModelError, Result};
pub use mask::{MaskTable, QualityMask};
pub use parameter::{Method, MethodId, Parameter};
pub use point::{RawPoint, Series, SeriesKind, TimeSeriesPoint};
pub use range::DomainRange;
