//! Hydrograph chart pipeline.
//!
//! [`ChartState`] is an immutable snapshot of everything the chart depends
//! on: fetched series and metadata plus UI state. [`ChartStore`] produces new
//! snapshots as fetches land and the UI changes, discarding stale fetches.
//! [`Hydrograph`] is the derived-value graph that turns a snapshot into what
//! a renderer draws.

pub mod config;
pub mod error;
pub mod hydrograph;
pub mod legend;
pub mod state;
pub mod store;

pub use config::ChartConfig;
pub use error::{ChartError, Result};
pub use hydrograph::{ChartFrame, ChartLayout, Hydrograph, SeriesFrame, TooltipPoint};
pub use legend::{layout_legend, legend_markers, LegendLayout, Marker, MarkerKind, PlacedMarker};
pub use state::{ChartState, CursorOffset, TimeWindow, Visibility};
pub use store::{ChartStore, FetchTicket, Resource};
