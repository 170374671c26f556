//! The hydrograph's derived-value graph.
//!
//! Every renderer-facing value is a node evaluated against a [`ChartState`]
//! snapshot. Per-series values are node families keyed by [`SeriesKind`], so
//! the current and compare series are cached independently.

use crate::config::{ChartConfig, Margins};
use crate::error::Result;
use crate::legend::{layout_legend, legend_markers, LegendLayout, Marker};
use crate::state::{kind_window, ChartState, CursorOffset, MethodSeries, TimeWindow};
use anyhow::anyhow;
use hydro_data::extent::value_extent;
use hydro_data::median::median_points;
use hydro_data::segments::distinct_data_masks;
use hydro_data::{build_segments, nearest_time, Segment};
use hydro_graph::{Family, Graph, NodeKey, Pass};
use hydro_model::flood::{nearest_stage, stage_index, FloodLevel, FloodLevels};
use hydro_model::parameter::{sort_methods, sorted_parameters};
use hydro_model::statistics::StatisticsSummary;
use hydro_model::temperature::{fahrenheit_series, is_converted_code, with_fahrenheit};
use hydro_model::{
    DomainRange, MaskTable, Method, MethodId, Parameter, Series, SeriesKind, TimeSeriesPoint,
};
use hydro_scale::{tick_set, value_domain, TickSet, ValueDomain, ValueScale, ViewportClass};
use hydro_utils::dates::to_date;
use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;

const KINDS: [SeriesKind; 3] = [SeriesKind::Current, SeriesKind::Compare, SeriesKind::Median];

/// Chart size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
}

impl ChartLayout {
    pub fn plot_width(&self) -> f64 {
        (self.width - self.margins.left - self.margins.right).max(0.0)
    }

    pub fn plot_height(&self) -> f64 {
        (self.height - self.margins.top - self.margins.bottom).max(0.0)
    }
}

/// A cursor point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TooltipPoint {
    pub time: i64,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

fn tooltip_point(
    point: Option<&TimeSeriesPoint>,
    x_scale: Option<&ValueScale>,
    y_scale: &ValueScale,
) -> Option<TooltipPoint> {
    let point = point?;
    let value = point.value?;
    let x = x_scale?.scale(point.time as f64);
    let y = y_scale.scale(value);
    (x.is_finite() && y.is_finite()).then_some(TooltipPoint {
        time: point.time,
        value,
        x,
        y,
    })
}

/// Method to show when the user has not picked one: the one with the most
/// points, ties going to the lowest id, else the first known method.
fn default_method(series: &MethodSeries, methods: &[Method]) -> Option<MethodId> {
    series
        .iter()
        .fold(None, |best: Option<(MethodId, usize)>, (id, series)| match best {
            Some((_, count)) if count >= series.len() => best,
            _ => Some((*id, series.len())),
        })
        .map(|(id, _)| id)
        .or_else(|| methods.first().map(|method| method.method_id))
}

/// One series as the renderer receives it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFrame {
    pub kind: SeriesKind,
    pub visible: bool,
    pub segments: Vec<Segment>,
    /// Set when this series could not be computed; the rest of the chart still renders.
    pub error: Option<String>,
}

/// Everything a renderer needs for one snapshot, from a single evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub title: String,
    pub description: String,
    pub layout: ChartLayout,
    pub use_symlog: bool,
    pub y_domain: ValueDomain,
    pub y_ticks: TickSet,
    pub y_tick_labels: Vec<String>,
    pub series: Vec<SeriesFrame>,
    pub groundwater_levels: Vec<TimeSeriesPoint>,
    pub cursor_points: BTreeMap<SeriesKind, TimeSeriesPoint>,
    pub tooltip_points: BTreeMap<SeriesKind, TooltipPoint>,
    pub groundwater_tooltip: Option<TooltipPoint>,
    pub legend: LegendLayout,
    pub flood_levels: Vec<FloodLevel>,
    /// Inundation stage nearest the selected gage height.
    pub flood_stage_height: Option<f64>,
    pub flood_stage_index: Option<usize>,
    pub current_method: Option<MethodId>,
    pub method_options: Vec<Method>,
    pub parameter_options: Vec<Parameter>,
}

pub struct Hydrograph {
    graph: Graph<ChartState>,
    pub parameter: NodeKey<Option<Parameter>>,
    pub use_symlog: NodeKey<bool>,
    pub viewport: NodeKey<ViewportClass>,
    pub layout: NodeKey<ChartLayout>,
    pub current_method: NodeKey<Option<MethodId>>,
    pub method_options: NodeKey<Vec<Method>>,
    pub statistics: NodeKey<Option<StatisticsSummary>>,
    pub visible: Family<SeriesKind, bool>,
    pub windows: Family<SeriesKind, Option<TimeWindow>>,
    pub points: Family<SeriesKind, Series>,
    pub segments: Family<SeriesKind, Vec<Segment>>,
    pub ranges: Family<SeriesKind, Option<DomainRange>>,
    pub groundwater_points: NodeKey<Series>,
    pub groundwater_range: NodeKey<Option<DomainRange>>,
    pub value_domain: NodeKey<ValueDomain>,
    pub y_ticks: NodeKey<TickSet>,
    pub x_scales: Family<SeriesKind, Option<ValueScale>>,
    pub y_scale: NodeKey<ValueScale>,
    pub cursor_offset: NodeKey<Option<i64>>,
    pub cursor_time: Family<SeriesKind, Option<i64>>,
    pub cursor_points: Family<SeriesKind, Option<TimeSeriesPoint>>,
    pub tooltip_points: Family<SeriesKind, Option<TooltipPoint>>,
    pub groundwater_cursor_point: NodeKey<Option<TimeSeriesPoint>>,
    pub groundwater_tooltip_point: NodeKey<Option<TooltipPoint>>,
    pub legend_markers: NodeKey<Vec<Marker>>,
    pub legend_layout: NodeKey<LegendLayout>,
    pub title: NodeKey<String>,
    pub description: NodeKey<String>,
    pub flood_levels: NodeKey<Vec<FloodLevel>>,
    pub flood_stage_height: NodeKey<Option<f64>>,
    pub flood_stage_index: NodeKey<Option<usize>>,
    pub parameter_options: NodeKey<Vec<Parameter>>,
}

impl Hydrograph {
    pub fn new(config: ChartConfig) -> Result<Self> {
        Hydrograph::with_mask_table(config, MaskTable::default())
    }

    pub fn with_mask_table(config: ChartConfig, mask_table: MaskTable) -> Result<Self> {
        let table = Rc::new(mask_table);
        let mut graph: Graph<ChartState> = Graph::new();

        let parameter = graph
            .node("parameter")
            .value(|s: &ChartState| s.parameter.clone())
            .compute(|inputs| Ok(inputs.get::<Option<Rc<Parameter>>>(0)?.as_deref().cloned()));

        let symlog_codes = config.symlog_parameters.clone();
        let use_symlog = graph.node("use_symlog").input(parameter).compute(move |inputs| {
            Ok(inputs
                .get::<Option<Parameter>>(0)?
                .as_ref()
                .map_or(false, |p| p.uses_symlog(&symlog_codes)))
        });

        let breakpoint = config.medium_screen_width;
        let viewport = graph
            .node("viewport")
            .value(|s: &ChartState| s.window_width)
            .compute(move |inputs| Ok(ViewportClass::from_width(*inputs.get::<f64>(0)?, breakpoint)));

        let (aspect_ratio, margins) = (config.aspect_ratio, config.margins);
        let layout = graph
            .node("layout")
            .value(|s: &ChartState| s.chart_width)
            .compute(move |inputs| {
                let width = *inputs.get::<f64>(0)?;
                Ok(ChartLayout {
                    width,
                    height: width * aspect_ratio,
                    margins,
                })
            });

        let current_method = graph
            .node("current_method")
            .value(|s: &ChartState| s.selected_method)
            .state(|s: &ChartState| Rc::clone(&s.current))
            .state(|s: &ChartState| Rc::clone(&s.methods))
            .compute(|inputs| {
                if let Some(selected) = *inputs.get::<Option<MethodId>>(0)? {
                    return Ok(Some(selected));
                }
                Ok(default_method(
                    inputs.get::<MethodSeries>(1)?,
                    inputs.get::<Vec<Method>>(2)?,
                ))
            });

        let method_options = graph
            .node("method_options")
            .state(|s: &ChartState| Rc::clone(&s.methods))
            .compute(|inputs| Ok(sort_methods(inputs.get::<Vec<Method>>(0)?)));

        let (priority, celsius_codes) = (
            config.parameter_priority.clone(),
            config.celsius_parameters.clone(),
        );
        let parameter_options = graph
            .node("parameter_options")
            .state(|s: &ChartState| Rc::clone(&s.parameters))
            .compute(move |inputs| {
                let offered = with_fahrenheit(inputs.get::<Vec<Parameter>>(0)?, &celsius_codes);
                Ok(sorted_parameters(&offered, &priority))
            });

        let statistics = graph
            .node("statistics")
            .input(parameter)
            .state(|s: &ChartState| Rc::clone(&s.statistics))
            .compute(|inputs| {
                let parameter = inputs.get::<Option<Parameter>>(0)?;
                let all = inputs.get::<BTreeMap<String, StatisticsSummary>>(1)?;
                Ok(parameter
                    .as_ref()
                    .and_then(|p| all.get(&p.parameter_code))
                    .cloned())
            });

        let visible = graph.family("visible", KINDS, |builder, kind| {
            let kind = *kind;
            Ok(builder
                .value(move |s: &ChartState| s.visibility.is_visible(kind))
                .compute(|inputs| Ok(*inputs.get::<bool>(0)?)))
        })?;

        let windows = graph.family("window", KINDS, |builder, kind| {
            let kind = *kind;
            Ok(builder
                .value(|s: &ChartState| s.time_window)
                .compute(move |inputs| kind_window(*inputs.get::<Option<TimeWindow>>(0)?, kind)))
        })?;

        let points = graph.family("points", KINDS, |builder, kind| match *kind {
            SeriesKind::Median => Ok(builder
                .input(statistics)
                .input(windows.get(kind)?)
                .compute(|inputs| {
                    let stats = inputs.get::<Option<StatisticsSummary>>(0)?;
                    let window = inputs.get::<Option<TimeWindow>>(1)?;
                    match (stats, window) {
                        (Some(stats), Some(window)) => {
                            Ok(Series::new(median_points(stats, window.start, window.end))?)
                        }
                        _ => Ok(Series::default()),
                    }
                })),
            iv_kind => {
                let celsius_codes = config.celsius_parameters.clone();
                Ok(builder
                    .state(move |s: &ChartState| s.series(iv_kind))
                    .input(current_method)
                    .input(parameter)
                    .compute_shared(move |inputs| {
                        let all = inputs.get::<MethodSeries>(0)?;
                        let method = inputs.get::<Option<MethodId>>(1)?;
                        let series: Rc<Series> = method
                            .and_then(|method| all.get(&method))
                            .cloned()
                            .unwrap_or_default();
                        // Fahrenheit parameters are fed the Celsius readings.
                        let converted = inputs
                            .get::<Option<Parameter>>(2)?
                            .as_ref()
                            .map_or(false, |p| is_converted_code(&p.parameter_code, &celsius_codes));
                        Ok(if converted {
                            Rc::new(fahrenheit_series(&series))
                        } else {
                            series
                        })
                    }))
            }
        })?;

        let segments = graph.family("segments", KINDS, |builder, kind| {
            let table = Rc::clone(&table);
            Ok(builder.input(points.get(kind)?).compute(move |inputs| {
                Ok(build_segments(inputs.get::<Series>(0)?.points(), &table)?)
            }))
        })?;

        let ranges = graph.family("range", KINDS, |builder, kind| {
            Ok(builder
                .input(points.get(kind)?)
                .compute(|inputs| Ok(value_extent(inputs.get::<Series>(0)?.points()))))
        })?;

        let groundwater_points = graph
            .node("groundwater_points")
            .state(|s: &ChartState| Rc::clone(&s.groundwater_levels))
            .input(windows.get(&SeriesKind::Current)?)
            .compute(|inputs| {
                let levels = inputs.get::<Series>(0)?;
                match inputs.get::<Option<TimeWindow>>(1)? {
                    Some(window) => Ok(Series::new(levels.strictly_within(window.start, window.end))?),
                    None => Ok(Series::default()),
                }
            });

        let groundwater_range = graph
            .node("groundwater_range")
            .input(groundwater_points)
            .compute(|inputs| Ok(value_extent(inputs.get::<Series>(0)?.points())));

        let padding_ratio = config.padding_ratio;
        let value_domain_key = graph
            .node("value_domain")
            .input(ranges.get(&SeriesKind::Current)?)
            .input(ranges.get(&SeriesKind::Compare)?)
            .input(ranges.get(&SeriesKind::Median)?)
            .input(groundwater_range)
            .input(visible.get(&SeriesKind::Compare)?)
            .input(visible.get(&SeriesKind::Median)?)
            .input(use_symlog)
            .compute(move |inputs| {
                let show_compare = *inputs.get::<bool>(4)?;
                let show_median = *inputs.get::<bool>(5)?;
                let mut candidates = Vec::new();
                candidates.extend(*inputs.get::<Option<DomainRange>>(0)?);
                candidates.extend(*inputs.get::<Option<DomainRange>>(3)?);
                if show_compare {
                    candidates.extend(*inputs.get::<Option<DomainRange>>(1)?);
                }
                if show_median {
                    candidates.extend(*inputs.get::<Option<DomainRange>>(2)?);
                }
                Ok(value_domain(&candidates, *inputs.get::<bool>(6)?, padding_ratio))
            });

        let tick_count = config.y_tick_count;
        let y_ticks = graph
            .node("y_ticks")
            .input(value_domain_key)
            .input(use_symlog)
            .input(viewport)
            .compute(move |inputs| {
                Ok(tick_set(
                    inputs.get::<ValueDomain>(0)?,
                    *inputs.get::<bool>(1)?,
                    *inputs.get::<ViewportClass>(2)?,
                    tick_count,
                ))
            });

        let x_scales = graph.family("x_scale", KINDS, |builder, kind| {
            Ok(builder
                .input(windows.get(kind)?)
                .input(layout)
                .compute(|inputs| {
                    let layout = inputs.get::<ChartLayout>(1)?;
                    Ok(inputs.get::<Option<TimeWindow>>(0)?.map(|window| {
                        ValueScale::linear(
                            DomainRange::new(window.start as f64, window.end as f64),
                            (0.0, layout.plot_width()),
                        )
                    }))
                }))
        })?;

        let y_scale = graph
            .node("y_scale")
            .input(value_domain_key)
            .input(use_symlog)
            .input(layout)
            .compute(|inputs| {
                let domain = inputs.get::<ValueDomain>(0)?.range;
                let range = (inputs.get::<ChartLayout>(2)?.plot_height(), 0.0);
                Ok(if *inputs.get::<bool>(1)? {
                    ValueScale::symlog(domain, range)
                } else {
                    ValueScale::linear(domain, range)
                })
            });

        let cursor_offset = graph
            .node("cursor_offset")
            .value(|s: &ChartState| s.cursor_offset)
            .input(windows.get(&SeriesKind::Current)?)
            .compute(|inputs| {
                let window = inputs.get::<Option<TimeWindow>>(1)?;
                Ok(match *inputs.get::<CursorOffset>(0)? {
                    CursorOffset::Hidden => None,
                    CursorOffset::Unset => window.map(|window| window.span()),
                    CursorOffset::At(offset) => Some(offset),
                })
            });

        let cursor_time = graph.family("cursor_time", KINDS, |builder, kind| {
            Ok(builder
                .input(cursor_offset)
                .input(windows.get(kind)?)
                .compute(|inputs| {
                    let offset = *inputs.get::<Option<i64>>(0)?;
                    let window = *inputs.get::<Option<TimeWindow>>(1)?;
                    match offset.zip(window) {
                        Some((offset, window)) => window
                            .start
                            .checked_add(offset)
                            .map(Some)
                            .ok_or_else(|| {
                                anyhow!("cursor offset {offset} overflows window start {}", window.start)
                            }),
                        None => Ok(None),
                    }
                }))
        })?;

        let cursor_points = graph.family("cursor_point", KINDS, |builder, kind| {
            Ok(builder
                .input(points.get(kind)?)
                .input(cursor_time.get(kind)?)
                .input(visible.get(kind)?)
                .compute(|inputs| {
                    if !*inputs.get::<bool>(2)? {
                        return Ok(None);
                    }
                    let series = inputs.get::<Series>(0)?;
                    Ok(inputs
                        .get::<Option<i64>>(1)?
                        .and_then(|time| nearest_time(series.points(), time))
                        .cloned())
                }))
        })?;

        let tooltip_points = graph.family("tooltip_point", KINDS, |builder, kind| {
            Ok(builder
                .input(cursor_points.get(kind)?)
                .input(x_scales.get(kind)?)
                .input(y_scale)
                .compute(|inputs| {
                    Ok(tooltip_point(
                        inputs.get::<Option<TimeSeriesPoint>>(0)?.as_ref(),
                        inputs.get::<Option<ValueScale>>(1)?.as_ref(),
                        inputs.get::<ValueScale>(2)?,
                    ))
                }))
        })?;

        let groundwater_cursor_point = graph
            .node("groundwater_cursor_point")
            .input(groundwater_points)
            .input(cursor_time.get(&SeriesKind::Current)?)
            .compute(|inputs| {
                let levels = inputs.get::<Series>(0)?;
                Ok(inputs
                    .get::<Option<i64>>(1)?
                    .and_then(|time| nearest_time(levels.points(), time))
                    .cloned())
            });

        let groundwater_tooltip_point = graph
            .node("groundwater_tooltip_point")
            .input(groundwater_cursor_point)
            .input(x_scales.get(&SeriesKind::Current)?)
            .input(y_scale)
            .compute(|inputs| {
                Ok(tooltip_point(
                    inputs.get::<Option<TimeSeriesPoint>>(0)?.as_ref(),
                    inputs.get::<Option<ValueScale>>(1)?.as_ref(),
                    inputs.get::<ValueScale>(2)?,
                ))
            });

        let legend_config = config.legend.clone();
        let legend_markers_key = graph
            .node("legend_markers")
            .input(visible.get(&SeriesKind::Current)?)
            .input(visible.get(&SeriesKind::Compare)?)
            .input(visible.get(&SeriesKind::Median)?)
            .input(statistics)
            .input(segments.get(&SeriesKind::Current)?)
            .input(segments.get(&SeriesKind::Compare)?)
            .compute(move |inputs| {
                let show_current = *inputs.get::<bool>(0)?;
                let show_compare = *inputs.get::<bool>(1)?;
                let show_median = *inputs.get::<bool>(2)?;
                let mut shown: Vec<&Segment> = Vec::new();
                if show_current {
                    shown.extend(inputs.get::<Vec<Segment>>(4)?);
                }
                if show_compare {
                    shown.extend(inputs.get::<Vec<Segment>>(5)?);
                }
                let masks = distinct_data_masks(shown);
                Ok(legend_markers(
                    show_current,
                    show_compare,
                    inputs.get::<Option<StatisticsSummary>>(3)?.as_ref(),
                    show_median,
                    &masks,
                    &legend_config,
                ))
            });

        let legend_config = config.legend.clone();
        let legend_layout = graph
            .node("legend_layout")
            .input(legend_markers_key)
            .input(layout)
            .compute(move |inputs| {
                Ok(layout_legend(
                    inputs.get::<Vec<Marker>>(0)?,
                    inputs.get::<ChartLayout>(1)?.width,
                    &legend_config,
                ))
            });

        let title = graph
            .node("title")
            .input(parameter)
            .state(|s: &ChartState| Rc::clone(&s.methods))
            .input(current_method)
            .compute(|inputs| {
                let mut title = inputs
                    .get::<Option<Parameter>>(0)?
                    .as_ref()
                    .map(|p| p.description.clone())
                    .unwrap_or_default();
                let methods = inputs.get::<Vec<Method>>(1)?;
                let current = *inputs.get::<Option<MethodId>>(2)?;
                if methods.len() > 1 {
                    let description = methods
                        .iter()
                        .find(|method| Some(method.method_id) == current)
                        .map(|method| method.method_description.as_str())
                        .filter(|description| !description.is_empty());
                    if let Some(description) = description {
                        title = format!("{}, {}", title, description);
                    }
                }
                Ok(title)
            });

        let description = graph
            .node("description")
            .input(parameter)
            .input(windows.get(&SeriesKind::Current)?)
            .compute(|inputs| {
                let parameter = inputs
                    .get::<Option<Parameter>>(0)?
                    .as_ref()
                    .map(|p| p.description.clone())
                    .unwrap_or_default();
                let dates = inputs
                    .get::<Option<TimeWindow>>(1)?
                    .and_then(|window| to_date(window.start).zip(to_date(window.end)));
                Ok(match dates {
                    Some((start, end)) => format!("{} from {} to {}", parameter, start, end),
                    None => parameter,
                })
            });

        let gage_height = config.gage_height_parameter.clone();
        let flood_levels = graph
            .node("flood_levels")
            .input(parameter)
            .state(|s: &ChartState| Rc::clone(&s.flood_levels))
            .input(value_domain_key)
            .compute(move |inputs| {
                let is_gage_height = inputs
                    .get::<Option<Parameter>>(0)?
                    .as_ref()
                    .map_or(false, |p| p.parameter_code == gage_height);
                if !is_gage_height {
                    return Ok(Vec::new());
                }
                let domain = inputs.get::<ValueDomain>(2)?.range;
                Ok(inputs
                    .get::<FloodLevels>(1)?
                    .levels()
                    .into_iter()
                    .filter(|level| domain.contains(level.value))
                    .collect())
            });

        let flood_stage_height = graph
            .node("flood_stage_height")
            .state(|s: &ChartState| Rc::clone(&s.flood_stages))
            .value(|s: &ChartState| s.gage_height)
            .compute(|inputs| {
                let stages = inputs.get::<Vec<f64>>(0)?;
                Ok(inputs
                    .get::<Option<f64>>(1)?
                    .and_then(|height| nearest_stage(stages, height)))
            });

        let flood_stage_index = graph
            .node("flood_stage_index")
            .state(|s: &ChartState| Rc::clone(&s.flood_stages))
            .input(flood_stage_height)
            .compute(|inputs| {
                let stages = inputs.get::<Vec<f64>>(0)?;
                Ok(inputs
                    .get::<Option<f64>>(1)?
                    .and_then(|stage| stage_index(stages, stage)))
            });

        log::info!("hydrograph graph built with {} nodes", graph.len());

        Ok(Hydrograph {
            graph,
            parameter,
            use_symlog,
            viewport,
            layout,
            current_method,
            method_options,
            statistics,
            visible,
            windows,
            points,
            segments,
            ranges,
            groundwater_points,
            groundwater_range,
            value_domain: value_domain_key,
            y_ticks,
            x_scales,
            y_scale,
            cursor_offset,
            cursor_time,
            cursor_points,
            tooltip_points,
            groundwater_cursor_point,
            groundwater_tooltip_point,
            legend_markers: legend_markers_key,
            legend_layout,
            title,
            description,
            flood_levels,
            flood_stage_height,
            flood_stage_index,
            parameter_options,
        })
    }

    pub fn evaluate<T: 'static>(&self, key: NodeKey<T>, state: &ChartState) -> Result<Rc<T>> {
        Ok(self.graph.evaluate(key, state)?)
    }

    pub fn pass<'g, 's>(&'g self, state: &'s ChartState) -> Pass<'g, 's, ChartState> {
        self.graph.pass(state)
    }

    /// Evaluate everything the renderer needs against one snapshot.
    ///
    /// A series whose own values fail is reported in its [`SeriesFrame`] and
    /// left out of the cursor maps, as is a failed groundwater tooltip.
    /// Failures of chart-wide values are errors.
    pub fn frame(&self, state: &ChartState) -> Result<ChartFrame> {
        let pass = self.graph.pass(state);

        let mut series = Vec::with_capacity(KINDS.len());
        let mut cursor_points = BTreeMap::new();
        let mut tooltip_points = BTreeMap::new();
        for kind in KINDS {
            let visible = *pass.get(self.visible.get(&kind)?)?;
            let mut failures = Vec::new();
            let segments = match pass.get(self.segments.get(&kind)?) {
                Ok(segments) => (*segments).clone(),
                Err(err) => {
                    failures.push(err);
                    Vec::new()
                }
            };
            match pass.get(self.cursor_points.get(&kind)?) {
                Ok(point) => {
                    if let Some(point) = &*point {
                        cursor_points.insert(kind, point.clone());
                    }
                }
                Err(err) => failures.push(err),
            }
            match pass.get(self.tooltip_points.get(&kind)?) {
                Ok(point) => {
                    if let Some(point) = *point {
                        tooltip_points.insert(kind, point);
                    }
                }
                Err(err) => failures.push(err),
            }
            let error = failures.first().map(|err| {
                log::warn!("{} series unavailable: {}", kind.as_str(), err);
                err.to_string()
            });
            series.push(SeriesFrame {
                kind,
                visible,
                segments,
                error,
            });
        }

        let groundwater_tooltip = match pass.get(self.groundwater_tooltip_point) {
            Ok(point) => *point,
            Err(err) => {
                log::warn!("groundwater tooltip unavailable: {}", err);
                None
            }
        };
        let y_ticks = pass.get(self.y_ticks)?;
        Ok(ChartFrame {
            title: (*pass.get(self.title)?).clone(),
            description: (*pass.get(self.description)?).clone(),
            layout: *pass.get(self.layout)?,
            use_symlog: *pass.get(self.use_symlog)?,
            y_domain: *pass.get(self.value_domain)?,
            y_tick_labels: y_ticks.labels(),
            y_ticks: (*y_ticks).clone(),
            series,
            groundwater_levels: pass.get(self.groundwater_points)?.points().to_vec(),
            cursor_points,
            tooltip_points,
            groundwater_tooltip,
            legend: (*pass.get(self.legend_layout)?).clone(),
            flood_levels: (*pass.get(self.flood_levels)?).clone(),
            flood_stage_height: *pass.get(self.flood_stage_height)?,
            flood_stage_index: *pass.get(self.flood_stage_index)?,
            current_method: *pass.get(self.current_method)?,
            method_options: (*pass.get(self.method_options)?).clone(),
            parameter_options: (*pass.get(self.parameter_options)?).clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartError;
    use crate::store::{ChartStore, Resource};
    use hydro_graph::GraphError;
    use hydro_model::statistics::DailyStatistic;
    use hydro_model::QualityMask;
    use hydro_scale::TickFormat;
    use hydro_utils::dates::{previous_year, MS_PER_HOUR};

    // 2018-01-02T00:00:00Z
    const START: i64 = 1_514_851_200_000;
    const METHOD: MethodId = MethodId(69928);

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn parameter(code: &str, description: &str) -> Parameter {
        Parameter {
            parameter_code: code.to_string(),
            description: description.to_string(),
            unit: "ft".to_string(),
            ..Default::default()
        }
    }

    fn hourly(start: i64, values: &[Option<f64>], qualifiers: &[&[&str]]) -> Series {
        let points = values
            .iter()
            .enumerate()
            .map(|(hour, value)| {
                let codes = qualifiers.get(hour).copied().unwrap_or(&["P"]);
                TimeSeriesPoint::new(start + hour as i64 * MS_PER_HOUR, *value, codes)
            })
            .collect();
        Series::new(points).unwrap()
    }

    fn tens() -> Vec<Option<f64>> {
        (1..=10).map(|v| Some(f64::from(v) * 10.0)).collect()
    }

    /// Ten hourly readings 10..=100 in a ten hour window.
    fn base_state() -> ChartState {
        ChartState::new()
            .with_parameter(parameter("00045", "Precipitation, total, inches"))
            .with_methods(vec![Method {
                method_id: METHOD,
                method_description: String::new(),
            }])
            .with_time_window(TimeWindow::new(START, START + 10 * MS_PER_HOUR))
            .with_series(SeriesKind::Current, METHOD, hourly(START, &tens(), &[]))
            .with_viewport(1024.0, 800.0)
    }

    fn hydrograph() -> Hydrograph {
        init_logger();
        Hydrograph::new(ChartConfig::default()).unwrap()
    }

    #[test]
    fn test_primary_only_domain_is_padded_and_clamped() {
        let hydro = hydrograph();
        let frame = hydro.frame(&base_state()).unwrap();
        assert!(frame.y_domain.has_data());
        assert_eq!(frame.y_domain.range.low, 0.0);
        assert!((frame.y_domain.range.high - 118.0).abs() < 1e-9);
        assert!(!frame.use_symlog);
        assert_eq!(frame.y_ticks.values, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(frame.y_ticks.format, TickFormat::Integer);
        assert_eq!(frame.y_tick_labels[5], "100");
    }

    #[test]
    fn test_no_data_gives_default_domain_and_no_ticks() {
        let hydro = hydrograph();
        let frame = hydro.frame(&ChartState::new()).unwrap();
        assert_eq!(frame.y_domain.range, DomainRange::unit());
        assert!(frame.y_ticks.values.is_empty());
        assert!(frame.series.iter().all(|s| s.segments.is_empty()));
        assert!(frame.cursor_points.is_empty());
        assert_eq!(frame.title, "");
    }

    #[test]
    fn test_symlog_parameter_adds_ticks_and_thins_on_narrow_screens() {
        let hydro = hydrograph();
        let values = [Some(5.0), Some(400.0), Some(1000.0)];
        let state = base_state()
            .with_parameter(parameter("00060", "Discharge, cubic feet per second"))
            .with_series(SeriesKind::Current, METHOD, hourly(START, &values, &[]));

        let wide = hydro.frame(&state).unwrap();
        assert!(wide.use_symlog);
        assert_eq!(
            wide.y_ticks.values,
            vec![4.0, 10.0, 15.0, 30.0, 50.0, 100.0, 200.0, 400.0, 600.0, 800.0, 1000.0]
        );

        let narrow = hydro.frame(&state.with_viewport(500.0, 800.0)).unwrap();
        assert_eq!(
            narrow.y_ticks.values,
            vec![4.0, 15.0, 50.0, 200.0, 600.0, 1000.0]
        );
    }

    #[test]
    fn test_compare_range_counts_only_when_visible() {
        let hydro = hydrograph();
        let compare_start = previous_year(START).unwrap();
        let state = base_state().with_series(
            SeriesKind::Compare,
            METHOD,
            hourly(compare_start, &[Some(50.0), Some(300.0)], &[]),
        );
        let hidden = hydro.frame(&state).unwrap();
        assert!((hidden.y_domain.range.high - 118.0).abs() < 1e-9);

        let shown = hydro
            .frame(&state.with_visible(SeriesKind::Compare, true))
            .unwrap();
        assert!((shown.y_domain.range.high - 358.0).abs() < 1e-9);
        assert_eq!(
            shown.cursor_points[&SeriesKind::Compare].time,
            compare_start + MS_PER_HOUR
        );
    }

    #[test]
    fn test_cursor_defaults_to_right_edge() {
        let hydro = hydrograph();
        let frame = hydro.frame(&base_state()).unwrap();
        let point = &frame.cursor_points[&SeriesKind::Current];
        assert_eq!(point.time, START + 9 * MS_PER_HOUR);
        assert_eq!(point.value, Some(100.0));

        let tooltip = frame.tooltip_points[&SeriesKind::Current];
        assert!((tooltip.x - 630.0).abs() < 1e-9);
        let plot_height = frame.layout.plot_height();
        assert!((tooltip.y - plot_height * (1.0 - 100.0 / 118.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cursor_offset_tie_picks_earlier_point() {
        let hydro = hydrograph();
        let state = base_state().with_cursor_offset(CursorOffset::At(5 * MS_PER_HOUR / 2));
        let frame = hydro.frame(&state).unwrap();
        assert_eq!(frame.cursor_points[&SeriesKind::Current].value, Some(30.0));

        let later = state.with_cursor_offset(CursorOffset::At(5 * MS_PER_HOUR / 2 + 1));
        let frame = hydro.frame(&later).unwrap();
        assert_eq!(frame.cursor_points[&SeriesKind::Current].value, Some(40.0));
    }

    #[test]
    fn test_hidden_cursor_has_no_points() {
        let hydro = hydrograph();
        let state = base_state().with_cursor_offset(CursorOffset::Hidden);
        let frame = hydro.frame(&state).unwrap();
        assert!(frame.cursor_points.is_empty());
        assert!(frame.tooltip_points.is_empty());
        assert_eq!(*hydro.evaluate(hydro.cursor_offset, &state).unwrap(), None);
    }

    #[test]
    fn test_null_cursor_point_has_no_tooltip() {
        let hydro = hydrograph();
        let mut values = tens();
        values[9] = None;
        let state = base_state().with_series(
            SeriesKind::Current,
            METHOD,
            hourly(START, &values, &[]),
        );
        let frame = hydro.frame(&state).unwrap();
        assert_eq!(frame.cursor_points[&SeriesKind::Current].value, None);
        assert!(frame.tooltip_points.is_empty());
    }

    #[test]
    fn test_cursor_offset_overflow_fails_only_cursor_values() {
        let hydro = hydrograph();
        let state = base_state().with_cursor_offset(CursorOffset::At(i64::MAX));
        let key = hydro.cursor_time.get(&SeriesKind::Current).unwrap();
        assert!(matches!(
            hydro.evaluate(key, &state),
            Err(ChartError::Graph(GraphError::ComputeFailure { .. }))
        ));

        let frame = hydro.frame(&state).unwrap();
        assert!(frame.cursor_points.is_empty());
        assert!(frame.tooltip_points.is_empty());
        assert_eq!(frame.groundwater_tooltip, None);
        let current = &frame.series[0];
        assert!(!current.segments.is_empty());
        assert!(current
            .error
            .as_deref()
            .map_or(false, |error| error.contains("cursor_time[Current]")));
        assert_eq!(frame.y_ticks.values, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn test_failed_compare_window_is_reported_on_its_series() {
        let hydro = hydrograph();
        // no year before this window fits in an i64
        let start = i64::MIN + MS_PER_HOUR;
        let state = ChartState::new()
            .with_parameter(parameter("00045", "Precipitation, total, inches"))
            .with_time_window(TimeWindow::new(start, start + 10 * MS_PER_HOUR))
            .with_series(SeriesKind::Current, METHOD, hourly(start, &tens(), &[]))
            .with_series(SeriesKind::Compare, METHOD, hourly(START, &[Some(1.0)], &[]))
            .with_visible(SeriesKind::Compare, true);

        let frame = hydro.frame(&state).unwrap();
        let compare = &frame.series[1];
        assert_eq!(compare.kind, SeriesKind::Compare);
        assert_eq!(compare.segments.len(), 1);
        assert!(compare
            .error
            .as_deref()
            .map_or(false, |error| error.contains("window[Compare]")));
        assert_eq!(frame.series[0].error, None);
        assert_eq!(frame.series[2].error, None);
        assert!(frame.cursor_points.contains_key(&SeriesKind::Current));
        assert!(!frame.cursor_points.contains_key(&SeriesKind::Compare));
        assert!(!frame.y_ticks.values.is_empty());
    }

    #[test]
    fn test_cursor_change_keeps_other_outputs() {
        let hydro = hydrograph();
        let state = base_state();
        let segments_key = hydro.segments.get(&SeriesKind::Current).unwrap();
        let cursor_key = hydro.cursor_points.get(&SeriesKind::Current).unwrap();

        let ticks = hydro.evaluate(hydro.y_ticks, &state).unwrap();
        let segments = hydro.evaluate(segments_key, &state).unwrap();
        let legend = hydro.evaluate(hydro.legend_layout, &state).unwrap();
        let cursor = hydro.evaluate(cursor_key, &state).unwrap();

        let moved = state.with_cursor_offset(CursorOffset::At(MS_PER_HOUR));
        assert!(Rc::ptr_eq(&ticks, &hydro.evaluate(hydro.y_ticks, &moved).unwrap()));
        assert!(Rc::ptr_eq(&segments, &hydro.evaluate(segments_key, &moved).unwrap()));
        assert!(Rc::ptr_eq(&legend, &hydro.evaluate(hydro.legend_layout, &moved).unwrap()));
        let moved_cursor = hydro.evaluate(cursor_key, &moved).unwrap();
        assert!(!Rc::ptr_eq(&cursor, &moved_cursor));
        assert_eq!(moved_cursor.as_ref().as_ref().map(|p| p.time), Some(START + MS_PER_HOUR));
    }

    #[test]
    fn test_compare_fetch_does_not_recompute_current_segments() {
        let hydro = hydrograph();
        let state = base_state();
        let key = hydro.segments.get(&SeriesKind::Current).unwrap();
        let before = hydro.evaluate(key, &state).unwrap();
        let with_compare = state.with_series(
            SeriesKind::Compare,
            METHOD,
            hourly(previous_year(START).unwrap(), &[Some(1.0)], &[]),
        );
        let after = hydro.evaluate(key, &with_compare).unwrap();
        assert!(Rc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_method_with_most_points_is_default() {
        let hydro = hydrograph();
        let other = MethodId(1);
        let state = base_state()
            .with_methods(vec![
                Method {
                    method_id: other,
                    method_description: "[Discontinued] Upstream".to_string(),
                },
                Method {
                    method_id: METHOD,
                    method_description: "From multiparameter sonde".to_string(),
                },
            ])
            .with_series(SeriesKind::Current, other, hourly(START, &[Some(7.0)], &[]));

        let frame = hydro.frame(&state).unwrap();
        assert_eq!(frame.current_method, Some(METHOD));
        assert_eq!(
            frame.title,
            "Precipitation, total, inches, From multiparameter sonde"
        );
        let options: Vec<MethodId> = frame.method_options.iter().map(|m| m.method_id).collect();
        assert_eq!(options, vec![METHOD, other]);

        let picked = hydro.frame(&state.with_selected_method(Some(other))).unwrap();
        assert_eq!(picked.current_method, Some(other));
        assert_eq!(picked.cursor_points[&SeriesKind::Current].value, Some(7.0));
        assert_eq!(picked.title, "Precipitation, total, inches, [Discontinued] Upstream");
    }

    #[test]
    fn test_description_names_window_dates() {
        let hydro = hydrograph();
        let frame = hydro.frame(&base_state()).unwrap();
        assert_eq!(frame.title, "Precipitation, total, inches");
        assert_eq!(
            frame.description,
            "Precipitation, total, inches from 2018-01-02 to 2018-01-02"
        );
    }

    #[test]
    fn test_median_series_and_legend() {
        let hydro = hydrograph();
        let mut statistics = BTreeMap::new();
        statistics.insert(
            "00045".to_string(),
            StatisticsSummary {
                parameter_code: "00045".to_string(),
                begin_year: Some(1969),
                end_year: Some(2017),
                values: vec![DailyStatistic {
                    month: 1,
                    day: 2,
                    p50: 500.0,
                }],
            },
        );
        let state = base_state().with_statistics(statistics);

        let hidden = hydro.frame(&state).unwrap();
        assert!((hidden.y_domain.range.high - 118.0).abs() < 1e-9);

        let shown = hydro
            .frame(&state.with_visible(SeriesKind::Median, true))
            .unwrap();
        let median = &shown.series[2];
        assert_eq!(median.kind, SeriesKind::Median);
        assert_eq!(median.segments.len(), 1);
        assert_eq!(median.segments[0].points[0].time, START);
        assert!(shown.y_domain.range.high > 500.0);
        let labels: Vec<&str> = shown
            .legend
            .markers
            .iter()
            .map(|m| m.marker.label.as_str())
            .collect();
        assert!(labels.contains(&"Median Discharge 1969 - 2017"));
    }

    #[test]
    fn test_legend_lists_masks_of_visible_series() {
        let hydro = hydrograph();
        let values = [Some(1.0), None, None, Some(2.0), None];
        let qualifiers: [&[&str]; 5] = [&["P"], &["Ice", "P"], &["Ice", "P"], &["P", "e"], &["Fld"]];
        let state = base_state()
            .with_series(
                SeriesKind::Current,
                METHOD,
                hourly(START, &values, &qualifiers),
            )
            .with_series(
                SeriesKind::Compare,
                METHOD,
                hourly(previous_year(START).unwrap(), &[None], &[&["Dry"]]),
            );

        let frame = hydro.frame(&state).unwrap();
        let labels: Vec<String> = frame
            .legend
            .markers
            .iter()
            .map(|m| m.marker.label.clone())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Current Year",
                "Current TS Masks",
                "Compare TS Masks",
                "Ice-Affected",
                "Flood"
            ]
        );
        let masks: Vec<Option<QualityMask>> = frame.series[0].segments.iter().map(|s| s.mask).collect();
        assert_eq!(
            masks,
            vec![
                None,
                Some(QualityMask::Ice),
                Some(QualityMask::Estimated),
                Some(QualityMask::Flood)
            ]
        );

        let both = hydro
            .frame(&state.with_visible(SeriesKind::Compare, true))
            .unwrap();
        let last = both.legend.markers.last().map(|m| m.marker.label.clone());
        assert_eq!(last.as_deref(), Some("Dry"));
        assert!(both.legend.rows >= 1);
    }

    #[test]
    fn test_groundwater_levels_inside_window_feed_domain() {
        let hydro = hydrograph();
        let levels = Series::new(vec![
            TimeSeriesPoint::new(START, Some(900.0), &["A"]),
            TimeSeriesPoint::new(START + 4 * MS_PER_HOUR, Some(200.0), &["A"]),
            TimeSeriesPoint::new(START + 20 * MS_PER_HOUR, Some(900.0), &["A"]),
        ])
        .unwrap();
        let state = base_state().with_groundwater_levels(levels);
        let frame = hydro.frame(&state).unwrap();
        // the level on the window edge and the one after it are excluded
        assert_eq!(frame.groundwater_levels.len(), 1);
        assert!((frame.y_domain.range.high - 238.0).abs() < 1e-9);
        let tooltip = frame.groundwater_tooltip.unwrap();
        assert_eq!(tooltip.time, START + 4 * MS_PER_HOUR);
        assert_eq!(tooltip.value, 200.0);
    }

    #[test]
    fn test_flood_levels_only_for_gage_height_within_domain() {
        let hydro = hydrograph();
        let floods = FloodLevels {
            action_stage: Some(20.0),
            flood_stage: Some(50.0),
            moderate_flood_stage: None,
            major_flood_stage: Some(500.0),
        };
        let state = base_state().with_flood_levels(floods);
        assert!(hydro.frame(&state).unwrap().flood_levels.is_empty());

        let gage = state.with_parameter(parameter("00065", "Gage height, feet"));
        let values: Vec<f64> = hydro
            .frame(&gage)
            .unwrap()
            .flood_levels
            .iter()
            .map(|level| level.value)
            .collect();
        assert_eq!(values, vec![20.0, 50.0]);
    }

    #[test]
    fn test_flood_stage_nearest_gage_height() {
        let hydro = hydrograph();
        let state = base_state().with_flood_stages(vec![9.0, 10.0, 11.0, 12.0]);
        let frame = hydro.frame(&state).unwrap();
        assert_eq!(frame.flood_stage_height, None);
        assert_eq!(frame.flood_stage_index, None);

        let near = hydro.frame(&state.with_gage_height(Some(10.4))).unwrap();
        assert_eq!(near.flood_stage_height, Some(10.0));
        assert_eq!(near.flood_stage_index, Some(1));

        // halfway between two stages resolves to the later one
        let halfway = hydro.frame(&state.with_gage_height(Some(10.5))).unwrap();
        assert_eq!(halfway.flood_stage_height, Some(11.0));
        assert_eq!(halfway.flood_stage_index, Some(2));

        let no_stages = ChartState::new().with_gage_height(Some(10.0));
        assert_eq!(*hydro.evaluate(hydro.flood_stage_height, &no_stages).unwrap(), None);
        assert_eq!(*hydro.evaluate(hydro.flood_stage_index, &no_stages).unwrap(), None);
    }

    #[test]
    fn test_parameter_options_sorted_with_fahrenheit_companions() {
        let hydro = hydrograph();
        let state = base_state().with_parameters(vec![
            parameter("00010", "Temperature, water, degrees Celsius"),
            Parameter {
                has_gw_levels_data: true,
                ..parameter("72019", "Depth to water level, feet below land surface")
            },
            parameter("00060", "Discharge, cubic feet per second"),
        ]);
        let frame = hydro.frame(&state).unwrap();
        let codes: Vec<&str> = frame
            .parameter_options
            .iter()
            .map(|p| p.parameter_code.as_str())
            .collect();
        assert_eq!(codes, vec!["00060", "72019", "00010", "00010F"]);
        assert_eq!(frame.parameter_options[3].unit, "deg F");
    }

    #[test]
    fn test_fahrenheit_parameter_converts_celsius_readings() {
        let hydro = hydrograph();
        let celsius = base_state()
            .with_parameter(parameter("00010", "Temperature, water, degrees Celsius"))
            .with_series(
                SeriesKind::Current,
                METHOD,
                hourly(START, &[Some(0.0), Some(100.0)], &[]),
            );
        let frame = hydro.frame(&celsius).unwrap();
        assert_eq!(frame.cursor_points[&SeriesKind::Current].value, Some(100.0));

        let fahrenheit = celsius.with_parameter(parameter(
            "00010F",
            "Temperature, water, degrees Fahrenheit",
        ));
        let frame = hydro.frame(&fahrenheit).unwrap();
        assert_eq!(frame.cursor_points[&SeriesKind::Current].value, Some(212.0));
        let first = &frame.series[0].segments[0].points[0];
        assert_eq!(first.value, Some(32.0));
    }

    #[test]
    fn test_stale_fetch_never_reaches_graph() {
        let hydro = hydrograph();
        let mut store = ChartStore::new(base_state());
        let slow = store.begin(Resource::Series(SeriesKind::Current));
        let fast = store.begin(Resource::Series(SeriesKind::Current));
        assert!(store.complete(fast, |s| s.with_series(
            SeriesKind::Current,
            METHOD,
            hourly(START, &[Some(1.0), Some(2.0)], &[])
        )));
        assert!(!store.complete(slow, |s| s.with_series(
            SeriesKind::Current,
            METHOD,
            hourly(START, &[Some(1000.0)], &[])
        )));
        let frame = hydro.frame(store.state()).unwrap();
        assert!(frame.y_domain.range.high < 10.0);
    }

    #[test]
    fn test_frame_serializes_for_renderer() {
        let hydro = hydrograph();
        let frame = hydro.frame(&base_state()).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["y_tick_labels"][1], "20");
        assert_eq!(json["series"][0]["kind"], "current");
        assert!(json["cursor_points"]["current"].is_object());
    }
}
