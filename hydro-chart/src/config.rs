use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Space around the plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            top: 15.0,
            right: 50.0,
            bottom: 10.0,
            left: 50.0,
        }
    }
}

/// Legend geometry. Widths are estimates, since text is never measured here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    /// A row wraps once its right edge reaches this fraction of the width.
    pub wrap_fraction: f64,
    /// Gap between one marker's label and the next marker.
    pub marker_group_offset: f64,
    /// Gap between a glyph and its label.
    pub marker_text_offset: f64,
    pub vertical_row_offset: f64,
    pub marker_y_position: f64,
    pub text_y_position: f64,
    /// Width of line and rectangle glyphs.
    pub glyph_width: f64,
    /// Estimated width of one label character.
    pub char_width: f64,
    pub circle_radius: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        LegendConfig {
            wrap_fraction: 0.6,
            marker_group_offset: 40.0,
            marker_text_offset: 10.0,
            vertical_row_offset: 20.0,
            marker_y_position: -4.0,
            text_y_position: 0.0,
            glyph_width: 20.0,
            char_width: 6.0,
            circle_radius: 4.0,
        }
    }
}

/// Chart constants, fixed when a [`crate::Hydrograph`] is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub padding_ratio: f64,
    pub y_tick_count: usize,
    /// Parameter codes drawn on a symlog axis.
    pub symlog_parameters: Vec<String>,
    /// Viewports at least this wide are treated as wide.
    pub medium_screen_width: f64,
    /// Chart height as a fraction of its width.
    pub aspect_ratio: f64,
    pub margins: Margins,
    pub legend: LegendConfig,
    /// Flood levels are only drawn for this parameter.
    pub gage_height_parameter: String,
    /// Parameter codes listed first in the parameter selection, in order.
    pub parameter_priority: Vec<String>,
    /// Codes reported in degrees Celsius that also get a Fahrenheit option.
    pub celsius_parameters: Vec<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            padding_ratio: 0.2,
            y_tick_count: 5,
            symlog_parameters: vec!["00060".to_string(), "72137".to_string()],
            medium_screen_width: 641.0,
            aspect_ratio: 0.5,
            margins: Margins::default(),
            legend: LegendConfig::default(),
            gage_height_parameter: "00065".to_string(),
            parameter_priority: vec!["00060".to_string()],
            celsius_parameters: vec!["00010".to_string(), "00020".to_string()],
        }
    }
}

impl ChartConfig {
    /// Parse a JSON object. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ChartConfig = serde_json::from_str(json)?;
        log::debug!("loaded chart config: {:?}", config);
        Ok(config)
    }
}
