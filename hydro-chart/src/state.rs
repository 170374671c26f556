//! Immutable chart state snapshots.
//!
//! Large fields are held behind `Rc` so a new snapshot shares everything it
//! did not change. The graph compares those fields by pointer, so replacing
//! one field never looks like a change to another.

use hydro_model::flood::FloodLevels;
use hydro_model::statistics::StatisticsSummary;
use hydro_model::{Method, MethodId, Parameter, Series, SeriesKind};
use crate::error::Result;
use anyhow::anyhow;
use chrono_tz::Tz;
use hydro_utils::dates::{previous_year, window_for_period};
use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Series for one kind, keyed by the method they were recorded with.
pub type MethodSeries = BTreeMap<MethodId, Rc<Series>>;

/// A requested time window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        TimeWindow {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// The window covering an ISO-8601 period such as "P7D" or "P1Y", ending
    /// at `end`, measured on the calendar of the site's time zone.
    pub fn for_period(end: i64, period: &str, zone: Tz) -> Result<Self> {
        let (start, end) = window_for_period(end, period, zone)?;
        Ok(TimeWindow::new(start, end))
    }

    pub fn span(&self) -> i64 {
        self.end - self.start
    }

    /// The same window one year earlier.
    pub fn previous_year(&self) -> anyhow::Result<Self> {
        match (previous_year(self.start), previous_year(self.end)) {
            (Some(start), Some(end)) => Ok(TimeWindow { start, end }),
            _ => Err(anyhow!("no previous year for window starting at {}", self.start)),
        }
    }
}

/// Window for a series kind, given the window of the current series.
pub fn kind_window(
    current: Option<TimeWindow>,
    kind: SeriesKind,
) -> anyhow::Result<Option<TimeWindow>> {
    match kind {
        SeriesKind::Compare => current.map(|window| window.previous_year()).transpose(),
        SeriesKind::Current | SeriesKind::Median => Ok(current),
    }
}

/// Cursor position as an offset from the start of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorOffset {
    /// Not set by the user; the cursor sits at the right edge.
    #[default]
    Unset,
    /// The cursor is not shown.
    Hidden,
    At(i64),
}

/// Which series kinds the user has switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub current: bool,
    pub compare: bool,
    pub median: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility {
            current: true,
            compare: false,
            median: false,
        }
    }
}

impl Visibility {
    pub fn is_visible(&self, kind: SeriesKind) -> bool {
        match kind {
            SeriesKind::Current => self.current,
            SeriesKind::Compare => self.compare,
            SeriesKind::Median => self.median,
        }
    }

    pub fn with(mut self, kind: SeriesKind, visible: bool) -> Self {
        match kind {
            SeriesKind::Current => self.current = visible,
            SeriesKind::Compare => self.compare = visible,
            SeriesKind::Median => self.median = visible,
        }
        self
    }
}

/// Everything the chart is derived from.
#[derive(Debug, Clone)]
pub struct ChartState {
    pub parameter: Option<Rc<Parameter>>,
    /// Every parameter the site offers, in the order they arrived.
    pub parameters: Rc<Vec<Parameter>>,
    pub methods: Rc<Vec<Method>>,
    pub current: Rc<MethodSeries>,
    pub compare: Rc<MethodSeries>,
    /// Median statistics keyed by parameter code.
    pub statistics: Rc<BTreeMap<String, StatisticsSummary>>,
    pub groundwater_levels: Rc<Series>,
    pub flood_levels: Rc<FloodLevels>,
    /// Gage heights with inundation maps, in the order the flood service lists them.
    pub flood_stages: Rc<Vec<f64>>,
    /// Gage height picked for the inundation map.
    pub gage_height: Option<f64>,
    /// Window of the current series; the compare window follows from it.
    pub time_window: Option<TimeWindow>,
    pub visibility: Visibility,
    pub selected_method: Option<MethodId>,
    pub cursor_offset: CursorOffset,
    /// Browser viewport width, which picks the tick density.
    pub window_width: f64,
    /// Width available to the chart itself.
    pub chart_width: f64,
}

impl Default for ChartState {
    fn default() -> Self {
        ChartState {
            parameter: None,
            parameters: Rc::new(Vec::new()),
            methods: Rc::new(Vec::new()),
            current: Rc::new(MethodSeries::new()),
            compare: Rc::new(MethodSeries::new()),
            statistics: Rc::new(BTreeMap::new()),
            groundwater_levels: Rc::new(Series::default()),
            flood_levels: Rc::new(FloodLevels::default()),
            flood_stages: Rc::new(Vec::new()),
            gage_height: None,
            time_window: None,
            visibility: Visibility::default(),
            selected_method: None,
            cursor_offset: CursorOffset::Unset,
            window_width: 1024.0,
            chart_width: 800.0,
        }
    }
}

impl ChartState {
    pub fn new() -> Self {
        ChartState::default()
    }

    /// Series of one kind. Median values are not stored as series.
    pub fn series(&self, kind: SeriesKind) -> Rc<MethodSeries> {
        match kind {
            SeriesKind::Current => Rc::clone(&self.current),
            SeriesKind::Compare => Rc::clone(&self.compare),
            SeriesKind::Median => Rc::new(MethodSeries::new()),
        }
    }

    /// Window for a series kind. The median follows the current window.
    pub fn window(&self, kind: SeriesKind) -> anyhow::Result<Option<TimeWindow>> {
        kind_window(self.time_window, kind)
    }

    pub fn with_parameter(&self, parameter: Parameter) -> Self {
        ChartState {
            parameter: Some(Rc::new(parameter)),
            ..self.clone()
        }
    }

    pub fn with_parameters(&self, parameters: Vec<Parameter>) -> Self {
        ChartState {
            parameters: Rc::new(parameters),
            ..self.clone()
        }
    }

    pub fn with_methods(&self, methods: Vec<Method>) -> Self {
        ChartState {
            methods: Rc::new(methods),
            ..self.clone()
        }
    }

    /// Replace every series of one kind. Ignored for the median.
    pub fn with_all_series(&self, kind: SeriesKind, series: MethodSeries) -> Self {
        let mut next = self.clone();
        match kind {
            SeriesKind::Current => next.current = Rc::new(series),
            SeriesKind::Compare => next.compare = Rc::new(series),
            SeriesKind::Median => log::warn!("median values are set through statistics"),
        }
        next
    }

    /// Add or replace the series for one method.
    pub fn with_series(&self, kind: SeriesKind, method: MethodId, series: Series) -> Self {
        let mut all = (*self.series(kind)).clone();
        all.insert(method, Rc::new(series));
        self.with_all_series(kind, all)
    }

    pub fn with_statistics(&self, statistics: BTreeMap<String, StatisticsSummary>) -> Self {
        ChartState {
            statistics: Rc::new(statistics),
            ..self.clone()
        }
    }

    pub fn with_groundwater_levels(&self, levels: Series) -> Self {
        ChartState {
            groundwater_levels: Rc::new(levels),
            ..self.clone()
        }
    }

    pub fn with_flood_levels(&self, levels: FloodLevels) -> Self {
        ChartState {
            flood_levels: Rc::new(levels),
            ..self.clone()
        }
    }

    pub fn with_flood_stages(&self, stages: Vec<f64>) -> Self {
        ChartState {
            flood_stages: Rc::new(stages),
            ..self.clone()
        }
    }

    pub fn with_gage_height(&self, gage_height: Option<f64>) -> Self {
        ChartState {
            gage_height,
            ..self.clone()
        }
    }

    pub fn with_time_window(&self, window: TimeWindow) -> Self {
        ChartState {
            time_window: Some(window),
            ..self.clone()
        }
    }

    pub fn with_visible(&self, kind: SeriesKind, visible: bool) -> Self {
        ChartState {
            visibility: self.visibility.with(kind, visible),
            ..self.clone()
        }
    }

    pub fn with_selected_method(&self, method: Option<MethodId>) -> Self {
        ChartState {
            selected_method: method,
            ..self.clone()
        }
    }

    pub fn with_cursor_offset(&self, offset: CursorOffset) -> Self {
        ChartState {
            cursor_offset: offset,
            ..self.clone()
        }
    }

    pub fn with_viewport(&self, window_width: f64, chart_width: f64) -> Self {
        ChartState {
            window_width,
            chart_width,
            ..self.clone()
        }
    }
}
