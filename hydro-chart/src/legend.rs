//! Legend markers and their placement.

use crate::config::LegendConfig;
use hydro_model::statistics::StatisticsSummary;
use hydro_model::QualityMask;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Line,
    Circle,
    Rectangle,
}

/// A legend entry: what glyph to draw and the label beside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub label: String,
    pub dom_id: Option<String>,
    pub class_name: Option<String>,
    pub group_id: Option<String>,
    pub fill: Option<String>,
    pub radius: Option<f64>,
}

impl Marker {
    pub fn line(dom_id: &str, class_name: &str, label: &str, group_id: &str) -> Self {
        Marker {
            kind: MarkerKind::Line,
            label: label.to_string(),
            dom_id: Some(dom_id.to_string()),
            class_name: Some(class_name.to_string()),
            group_id: Some(group_id.to_string()),
            fill: None,
            radius: None,
        }
    }

    pub fn circle(radius: f64, class_name: &str, label: &str, group_id: &str) -> Self {
        Marker {
            kind: MarkerKind::Circle,
            label: label.to_string(),
            dom_id: None,
            class_name: Some(class_name.to_string()),
            group_id: Some(group_id.to_string()),
            fill: None,
            radius: Some(radius),
        }
    }

    pub fn rectangle(class_name: &str, label: &str, fill: Option<&str>) -> Self {
        Marker {
            kind: MarkerKind::Rectangle,
            label: label.to_string(),
            dom_id: None,
            class_name: Some(class_name.to_string()),
            group_id: None,
            fill: fill.map(str::to_string),
            radius: None,
        }
    }

    /// Width of the glyph alone.
    pub fn glyph_width(&self, config: &LegendConfig) -> f64 {
        match self.kind {
            MarkerKind::Circle => 2.0 * self.radius.unwrap_or(config.circle_radius),
            MarkerKind::Line | MarkerKind::Rectangle => config.glyph_width,
        }
    }

    /// Estimated width of the label text.
    pub fn label_width(&self, config: &LegendConfig) -> f64 {
        self.label.chars().count() as f64 * config.char_width
    }

    /// Glyph, gap and label together.
    pub fn width(&self, config: &LegendConfig) -> f64 {
        self.glyph_width(config) + config.marker_text_offset + self.label_width(config)
    }
}

/// A marker with its position. Coordinates already include the centering shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedMarker {
    pub marker: Marker,
    pub row: usize,
    pub x: f64,
    pub y: f64,
    pub text_x: f64,
    pub text_y: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendLayout {
    pub markers: Vec<PlacedMarker>,
    pub rows: usize,
    /// Width of the widest row.
    pub width: f64,
    /// Horizontal shift applied to center the legend.
    pub translate_x: f64,
}

/// Lay markers out left to right, wrapping and centering within `width`.
///
/// After a marker is placed, a row whose right edge has reached
/// `wrap_fraction` of `width` is closed and the next marker starts a new one.
/// Rectangles sit higher than other glyphs in the same row.
pub fn layout_legend(markers: &[Marker], width: f64, config: &LegendConfig) -> LegendLayout {
    let mut placed = Vec::with_capacity(markers.len());
    let mut row = 0;
    let mut previous_right: Option<f64> = None;
    let mut legend_width: f64 = 0.0;

    for marker in markers {
        let x = previous_right.map_or(0.0, |right| right + config.marker_group_offset);
        let row_offset = config.vertical_row_offset * row as f64;
        let y = match marker.kind {
            MarkerKind::Rectangle => config.marker_y_position * 2.5 + row_offset,
            MarkerKind::Line | MarkerKind::Circle => config.marker_y_position + row_offset,
        };
        let text_x = x + marker.glyph_width(config) + config.marker_text_offset;
        let right = text_x + marker.label_width(config);
        legend_width = legend_width.max(right);

        placed.push(PlacedMarker {
            marker: marker.clone(),
            row,
            x,
            y,
            text_x,
            text_y: config.text_y_position + row_offset,
            width: right - x,
        });

        if width > 0.0 && right / width >= config.wrap_fraction {
            row += 1;
            previous_right = None;
        } else {
            previous_right = Some(right);
        }
    }

    let translate_x = (width - legend_width) / 2.0;
    for marker in placed.iter_mut() {
        marker.x += translate_x;
        marker.text_x += translate_x;
    }
    let rows = placed.last().map_or(0, |marker| marker.row + 1);

    LegendLayout {
        markers: placed,
        rows,
        width: legend_width,
        translate_x,
    }
}

/// Legend label for the median series, with its period of record when known.
pub fn median_label(statistics: Option<&StatisticsSummary>) -> String {
    match statistics.and_then(|stats| stats.begin_year.zip(stats.end_year)) {
        Some((begin, end)) => format!("Median Discharge {} - {}", begin, end),
        None => "Median Discharge".to_string(),
    }
}

/// Markers for the visible series, the mask hatches, then each data mask in
/// `masks` (expected in first-seen order).
pub fn legend_markers(
    show_current: bool,
    show_compare: bool,
    median: Option<&StatisticsSummary>,
    show_median: bool,
    masks: &[QualityMask],
    config: &LegendConfig,
) -> Vec<Marker> {
    let mut markers = Vec::new();
    if show_current {
        markers.push(Marker::line("ts-current", "line", "Current Year", "current-line-marker"));
    }
    if show_compare {
        markers.push(Marker::line("ts-compare", "line", "Last Year", "compare-line-marker"));
    }
    if show_median {
        markers.push(Marker::circle(
            config.circle_radius,
            "median-data-series",
            &median_label(median),
            "median-circle-marker",
        ));
    }
    markers.push(Marker::rectangle("mask", "Current TS Masks", Some("url(#hash-45)")));
    markers.push(Marker::rectangle("mask", "Compare TS Masks", Some("url(#hash-135)")));
    markers.extend(
        masks
            .iter()
            .filter(|mask| mask.is_data_mask())
            .map(|mask| Marker::rectangle(&mask.class_name(), mask.description(), None)),
    );
    markers
}
